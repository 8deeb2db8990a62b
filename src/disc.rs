use regex::Regex;
use std::fmt;

/// Series, season and disc parsed from a directory such as `Show_Name_S1_D2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowIdentity {
    pub series_name: String,
    pub season_number: u32,
    pub disc_number: u32,
    pub original_dir_name: String,
}

impl ShowIdentity {
    /// Parse a directory base name of the form `<Series_Token>_S<digits>_D<digits>`.
    ///
    /// Returns `None` when the name does not follow the convention or when the
    /// season or disc number is zero; such directories are not disc rips.
    pub fn parse(dir_name: &str) -> Option<Self> {
        let re = Regex::new(r"^(.+?)_S(\d+)_D(\d+)$").ok()?;
        let captures = re.captures(dir_name)?;

        let season_number = captures[2].parse::<u32>().ok().filter(|&n| n > 0)?;
        let disc_number = captures[3].parse::<u32>().ok().filter(|&n| n > 0)?;

        Some(Self {
            series_name: series_name_from_token(&captures[1]),
            season_number,
            disc_number,
            original_dir_name: dir_name.to_string(),
        })
    }

    /// Directory name of another disc of the same series and season.
    pub fn sibling_dir_name(&self, disc_number: u32) -> String {
        disc_dir_name(&self.series_name, self.season_number, disc_number)
    }

    /// Whether `other` is disc `disc_number` of the same series and season.
    pub fn is_disc_of_same_season(&self, other: &ShowIdentity, disc_number: u32) -> bool {
        other.series_name == self.series_name
            && other.season_number == self.season_number
            && other.disc_number == disc_number
    }
}

impl fmt::Display for ShowIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} season {} disc {}",
            self.series_name, self.season_number, self.disc_number
        )
    }
}

/// Build a disc directory name: the inverse of [`ShowIdentity::parse`].
pub fn disc_dir_name(series_name: &str, season_number: u32, disc_number: u32) -> String {
    format!(
        "{}_S{}_D{}",
        series_token_from_name(series_name),
        season_number,
        disc_number
    )
}

fn series_name_from_token(token: &str) -> String {
    token.replace('_', " ")
}

fn series_token_from_name(name: &str) -> String {
    name.replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let identity = ShowIdentity::parse("Show_Name_S1_D2").unwrap();
        assert_eq!(identity.series_name, "Show Name");
        assert_eq!(identity.season_number, 1);
        assert_eq!(identity.disc_number, 2);
        assert_eq!(identity.original_dir_name, "Show_Name_S1_D2");
    }

    #[test]
    fn test_parse_padded_numbers() {
        let identity = ShowIdentity::parse("The_Wire_S03_D04").unwrap();
        assert_eq!(identity.series_name, "The Wire");
        assert_eq!(identity.season_number, 3);
        assert_eq!(identity.disc_number, 4);
    }

    #[test]
    fn test_parse_multi_digit() {
        let identity = ShowIdentity::parse("Long_Runner_S12_D10").unwrap();
        assert_eq!(identity.season_number, 12);
        assert_eq!(identity.disc_number, 10);
    }

    #[test]
    fn test_parse_series_token_containing_marker() {
        let identity = ShowIdentity::parse("Odd_S1_D1_Name_S2_D3").unwrap();
        assert_eq!(identity.series_name, "Odd S1 D1 Name");
        assert_eq!(identity.season_number, 2);
        assert_eq!(identity.disc_number, 3);
    }

    #[test]
    fn test_parse_no_match() {
        assert_eq!(ShowIdentity::parse("Show Name Season 1"), None);
        assert_eq!(ShowIdentity::parse("Show_Name_S1"), None);
        assert_eq!(ShowIdentity::parse("Show_Name_S1_D2_extra"), None);
        assert_eq!(ShowIdentity::parse("_S1_D1"), None);
        assert_eq!(ShowIdentity::parse("Show_Name_s1_d1"), None);
        assert_eq!(ShowIdentity::parse("Show_Name_SA_D1"), None);
    }

    #[test]
    fn test_parse_rejects_zero_and_overflow() {
        assert_eq!(ShowIdentity::parse("Show_S0_D1"), None);
        assert_eq!(ShowIdentity::parse("Show_S1_D0"), None);
        assert_eq!(ShowIdentity::parse("Show_S1_D99999999999"), None);
    }

    #[test]
    fn test_disc_dir_name() {
        assert_eq!(disc_dir_name("Show Name", 1, 2), "Show_Name_S1_D2");
        assert_eq!(disc_dir_name("Single", 10, 1), "Single_S10_D1");
    }

    #[test]
    fn test_naming_convention_round_trip() {
        let identity = ShowIdentity::parse("Show_Name_S2_D3").unwrap();
        let previous = identity.sibling_dir_name(1);
        assert_eq!(previous, "Show_Name_S2_D1");

        let parsed = ShowIdentity::parse(&previous).unwrap();
        assert!(identity.is_disc_of_same_season(&parsed, 1));
        assert!(!identity.is_disc_of_same_season(&parsed, 2));
    }

    #[test]
    fn test_display() {
        let identity = ShowIdentity::parse("Show_Name_S1_D2").unwrap();
        assert_eq!(identity.to_string(), "Show Name season 1 disc 2");
    }
}
