use std::{
    fmt,
    fmt::{Debug, Display},
};

/// Wraps a credential so that it can't end up in logs by accident. Use [`Secret::reveal`] at the point of use.
#[derive(Clone, Default)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl<T: Clone + Default + AsRef<str>> Secret<T> {
    pub fn is_empty(&self) -> bool {
        self.value.as_ref().is_empty()
    }

    /// A partial preview suitable for startup logs, e.g. `rzp_****4x`.
    pub fn masked(&self) -> String {
        mask(self.value.as_ref())
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

/// Shows the first four and last two characters of a value. Short values are hidden entirely.
pub fn mask(value: &str) -> String {
    let chars = value.chars().collect::<Vec<char>>();
    match chars.len() {
        0 => "(empty)".to_string(),
        n if n <= 6 => "****".to_string(),
        n => {
            let head = chars[..4].iter().collect::<String>();
            let tail = chars[n - 2..].iter().collect::<String>();
            format!("{head}****{tail}")
        },
    }
}
