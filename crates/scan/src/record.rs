use time::OffsetDateTime;

/// One valid entry of the image repository, straight from a directory listing.
///
/// Records are transient: they exist only between the directory scan and the
/// snapshot reduction, and are never persisted in this form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRecord {
    /// Product code, parsed from the all-digits filename stem.
    pub codprod: i64,
    /// Filename suffix after the last dot, lowercased, without the leading
    /// dot. Empty when the file has no suffix at all.
    pub extensao: String,
    /// Filesystem modification time of the image file.
    pub modified_at: OffsetDateTime,
}

impl FileRecord {
    /// Build a record from a bare filename, or `None` when the stem is not a
    /// product code.
    ///
    /// Stems are trimmed of surrounding whitespace before the digit check
    /// (files like `" 42 .jpg"` have been observed on the mount). A stem of
    /// digits too large for an `i64` is treated as non-numeric rather than an
    /// error; no real product code gets anywhere near that range.
    pub fn from_file_name(name: &str, modified_at: OffsetDateTime) -> Option<Self> {
        let (stem, extensao) = split_extension(name);
        let codprod = parse_codprod(stem)?;
        Some(Self { codprod, extensao: extensao.to_ascii_lowercase(), modified_at })
    }
}

/// Whether a filename carries a product code as its stem.
///
/// Shared with the repository sweep utility, which deletes everything this
/// returns `false` for.
pub fn has_numeric_stem(name: &str) -> bool {
    parse_codprod(split_extension(name).0).is_some()
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rsplit_once('.') {
        Some((stem, extension)) => (stem, extension),
        None => (name, ""),
    }
}

fn parse_codprod(stem: &str) -> Option<i64> {
    let stem = stem.trim();
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(name: &str) -> Option<FileRecord> {
        FileRecord::from_file_name(name, OffsetDateTime::UNIX_EPOCH)
    }

    #[rstest]
    #[case("100.jpg", 100, "jpg")]
    #[case("200.PNG", 200, "png")]
    #[case("0.webp", 0, "webp")]
    #[case("300", 300, "")]
    #[case("300.", 300, "")]
    #[case(" 42 .jpg", 42, "jpg")]
    fn test_valid_names(#[case] name: &str, #[case] codprod: i64, #[case] extensao: &str) {
        let record = record(name).expect("name should parse");
        assert_eq!(record.codprod, codprod);
        assert_eq!(record.extensao, extensao);
    }

    #[rstest]
    #[case("abc.jpg")]
    #[case("12a34.jpg")]
    #[case("10.tar.gz")] // stem "10.tar" is not all digits
    #[case(".jpg")]
    #[case("")]
    #[case("١٢٣.jpg")] // only ASCII digits count
    #[case("99999999999999999999999.jpg")] // i64 overflow
    fn test_invalid_names(#[case] name: &str) {
        assert!(record(name).is_none());
        assert!(!has_numeric_stem(name));
    }

    #[test]
    fn test_numeric_stem_matches_record_parsing() {
        assert!(has_numeric_stem("12345.jpeg"));
        assert!(has_numeric_stem("12345"));
        assert!(!has_numeric_stem("thumbs.db"));
    }
}
