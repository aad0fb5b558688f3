use serde::{Deserialize, Deserializer};

/// Strips surrounding whitespace.
///
/// ```
/// use gametracker::normalization::normalize_text;
/// assert_eq!(normalize_text(" Chrono Trigger\n"), "Chrono Trigger");
/// ```
pub fn normalize_text(text: impl AsRef<str>) -> String {
    text.as_ref().trim().to_owned()
}

/// Reduces a string to a comparison key: trimmed, lowercased, and with
/// diacritics removed by decomposing into Unicode Normalization Form D
/// and dropping the combining marks.
///
/// ```
/// use gametracker::normalization::fold;
/// assert_eq!(fold(" Difícil "), "dificil");
/// ```
pub fn fold(text: impl AsRef<str>) -> String {
    use unicode_normalization::char::is_combining_mark;
    use unicode_normalization::UnicodeNormalization;

    let folded: String = text
        .as_ref()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();

    folded.trim().to_owned()
}

/// Deserializes an integer that may have been stored as a float by an
/// older writer, rounding it.
pub fn deserialize_whole<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: WholeNumber,
{
    use serde::de::Error;

    let n: f64 = Deserialize::deserialize(deserializer)?;

    T::from_f64(n).ok_or_else(|| D::Error::custom(format!("{} is out of range", n)))
}

/// Integer types a stored float can be rounded into.
pub trait WholeNumber: Sized {
    fn from_f64(n: f64) -> Option<Self>;
}

impl WholeNumber for u8 {
    fn from_f64(n: f64) -> Option<Self> {
        let n = n.round();

        if n.is_finite() && n >= 0.0 && n <= f64::from(u8::MAX) {
            Some(n as u8)
        } else {
            None
        }
    }
}

impl WholeNumber for i32 {
    fn from_f64(n: f64) -> Option<Self> {
        let n = n.round();

        if n.is_finite() && n >= f64::from(i32::MIN) && n <= f64::from(i32::MAX) {
            Some(n as i32)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{fold, normalize_text, WholeNumber};

    fn count_whitespace(s: impl AsRef<str>) -> usize {
        s.as_ref().chars().filter(|c| c.is_whitespace()).count()
    }

    #[test]
    fn folding_ignores_case_and_accents() {
        assert_eq!(fold("FÁCIL"), "facil");
        assert_eq!(fold("fácil"), fold("Facil"));
        assert_eq!(fold("Normal"), "normal");
        assert_eq!(fold("reseñas"), "resenas");
    }

    #[test]
    fn whole_numbers_round_and_reject_out_of_range() {
        assert_eq!(u8::from_f64(4.6), Some(5));
        assert_eq!(u8::from_f64(-1.0), None);
        assert_eq!(u8::from_f64(f64::NAN), None);
        assert_eq!(i32::from_f64(1995.0), Some(1995));
        assert_eq!(i32::from_f64(f64::INFINITY), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 10000, ..ProptestConfig::default()
        })]

        #[test]
        fn normalization_works(string in "(\\S.*\\S|\\S+)", space_before in "\\s*", space_after in "\\s*") {
            let normalized = normalize_text(format!("{}{}{}", space_before, string, space_after));

            prop_assert!(!normalized.starts_with(char::is_whitespace) && !normalized.ends_with(char::is_whitespace), "{:?} (normalized form of {:?}) has no leading or trailing whitespace", normalized, string);

            prop_assert_eq!(count_whitespace(&normalized), count_whitespace(&string), "{:?} (normalized form of {:?}) preserves inner whitespace", normalized, string);
        }

        #[test]
        fn folding_is_idempotent(string in "[a-zA-Z\u{c0}-\u{ff} ]*") {
            let once = fold(&string);

            prop_assert_eq!(fold(&once), once.clone());
        }
    }
}
