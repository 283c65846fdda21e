//! Name-to-object maps.
use std::{collections::HashMap, rc::Weak};

use super::{HObject, Object};
use crate::Error;

/// Check if `name` is a valid object name.
///
/// A valid name is not blank, does not start with a digit, and consists of
/// ASCII alphanumeric characters and underscores. A `$` may only appear as
/// the first character (as in `$parentButton`).
pub fn check_name(name: &str) -> Result<(), Error> {
    let invalid = || Err(Error::InvalidName(name.to_owned()));

    if name.trim().is_empty() {
        return invalid();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return invalid();
    }
    for (i, c) in name.char_indices() {
        let ok = match c {
            '$' => i == 0,
            '_' => true,
            c => c.is_ascii_alphanumeric(),
        };
        if !ok {
            return invalid();
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    objects: HashMap<String, Weak<Object>>,
}

impl Registry {
    pub(crate) fn add(&mut self, obj: &HObject) -> Result<(), Error> {
        let name = obj.name();
        if let Some(existing) = self.objects.get(name) {
            if existing.strong_count() > 0 && !obj.is(existing) {
                return Err(Error::DuplicateName(name.to_owned()));
            }
        }
        self.objects.insert(name.to_owned(), obj.downgrade());
        Ok(())
    }

    /// Remove `obj` if it is the object registered under its name.
    pub(crate) fn remove(&mut self, obj: &HObject) {
        let is_same = self.objects.get(obj.name()).map_or(false, |w| obj.is(w));
        if is_same {
            self.objects.remove(obj.name());
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<HObject> {
        self.objects
            .get(name)
            .and_then(HObject::upgrade)
            .filter(|obj| !obj.is_destroyed())
    }

    pub(crate) fn len(&self) -> usize {
        self.objects
            .values()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        for name in &["Foo", "Foo_Bar2", "$parentTitle", "_x"] {
            assert_eq!(check_name(name), Ok(()), "{}", name);
        }
    }

    #[test]
    fn invalid_names() {
        for name in &["", "  ", "2Foo", "Foo$Bar", "Foo Bar", "Foo-Bar", "$$x"] {
            assert_eq!(
                check_name(name),
                Err(Error::InvalidName((*name).to_owned())),
                "{:?}",
                name
            );
        }
    }
}
