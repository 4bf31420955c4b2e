use std::collections::BTreeSet;

/// A set of URLs chosen by the user.
///
/// Membership is all that matters; iteration order is lexicographic so the
/// URL list sent to the server is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    members: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.members.contains(url)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.members.iter().cloned().collect()
    }

    /// Flips membership of one URL and returns whether it is now selected.
    pub fn toggle(&mut self, url: &str) -> bool {
        if self.members.remove(url) {
            false
        } else {
            self.members.insert(url.to_string());
            true
        }
    }

    /// True when `urls` is non-empty and every one of them is selected.
    pub fn all_selected<'a, I>(&self, urls: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut any = false;
        for url in urls {
            if !self.members.contains(url) {
                return false;
            }
            any = true;
        }
        any
    }

    /// Symmetric select-all over a subset: removes every URL of the subset when
    /// all of them are selected, otherwise adds all of them. Members outside
    /// the subset are never touched.
    pub fn toggle_all<'a, I>(&mut self, urls: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let subset: Vec<&str> = urls.into_iter().collect();
        if self.all_selected(subset.iter().copied()) {
            for url in subset {
                self.members.remove(url);
            }
        } else {
            self.members
                .extend(subset.into_iter().map(ToOwned::to_owned));
        }
    }
}

impl FromIterator<String> for Selection {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}
