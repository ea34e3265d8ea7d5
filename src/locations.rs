use lazy_static::*;
use regex::Regex;
use std::collections::HashSet;

// Suffixes that registrar room codes glue onto the building letters
// (basement, lower level, lab, garden). Tried in this order.
const ROOM_ENDINGS: &[&str] = &["B", "LL", "L", "G"];

lazy_static! {
    static ref ROOM_RE: Regex = Regex::new(r"([A-Za-z]+)(\d+[A-Za-z]?)").unwrap();
    static ref ROOM_EXACT_RE: Regex = Regex::new(r"^([A-Za-z]+)(\d+[A-Za-z]?)$").unwrap();
}

/// Finds every room mention in a raw location field and returns the codes
/// uppercased. Registrar data concatenates codes freely ("SCA214 SCAB105",
/// "KAMB21/23"), so each "letters, digits, optional trailing letter" hit is
/// one room occurrence.
pub fn split_location(raw: &str) -> Vec<String> {
    ROOM_RE
        .find_iter(raw)
        .map(|m| m.as_str().to_uppercase())
        .collect()
}

/// Extracts the building prefix from a room code, correcting for glued-on
/// room endings. "THHLL101" with "THH" known resolves to "THH"; an unknown
/// prefix comes back raw so the room still gets a grid entry.
///
/// None only when the code does not look like a room at all.
pub fn resolve_building_prefix(room_code: &str, known_buildings: &HashSet<String>) -> Option<String> {
    let captures = ROOM_EXACT_RE.captures(room_code)?;
    let prefix = captures.get(1)?.as_str();

    for ending in ROOM_ENDINGS {
        if let Some(stripped) = prefix.strip_suffix(ending) {
            if known_buildings.contains(stripped) {
                return Some(stripped.to_string());
            }
        }
    }

    Some(prefix.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(codes: &[&str]) -> HashSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn splits_single_and_concatenated_rooms() {
        assert_eq!(split_location("THH101"), vec!["THH101"]);
        assert_eq!(split_location("SCA214 SCAB105"), vec!["SCA214", "SCAB105"]);
        assert_eq!(split_location("KAMB21/23"), vec!["KAMB21"]);
        assert_eq!(split_location("thh101"), vec!["THH101"]);
        assert!(split_location("ONLINE").is_empty());
        assert!(split_location("").is_empty());
    }

    #[test]
    fn trailing_letter_stays_with_the_room() {
        assert_eq!(split_location("GFS106A"), vec!["GFS106A"]);
    }

    #[test]
    fn resolves_plain_prefix() {
        assert_eq!(
            resolve_building_prefix("ABC101", &known(&["ABC"])),
            Some("ABC".to_string())
        );
    }

    #[test]
    fn strips_glued_room_endings() {
        let buildings = known(&["THH", "SCA"]);

        assert_eq!(
            resolve_building_prefix("THHLL101", &buildings),
            Some("THH".to_string())
        );
        assert_eq!(
            resolve_building_prefix("SCAB105", &buildings),
            Some("SCA".to_string())
        );
    }

    #[test]
    fn unknown_prefix_comes_back_raw() {
        let buildings = known(&["THH"]);

        assert_eq!(
            resolve_building_prefix("ZZZ12", &buildings),
            Some("ZZZ".to_string())
        );
        // Stripping only applies when the stripped form is a known building.
        assert_eq!(
            resolve_building_prefix("XYZLL12", &buildings),
            Some("XYZLL".to_string())
        );
    }

    #[test]
    fn non_room_text_is_none() {
        let buildings = known(&["THH"]);

        assert_eq!(resolve_building_prefix("ONLINE", &buildings), None);
        assert_eq!(resolve_building_prefix("101", &buildings), None);
        assert_eq!(resolve_building_prefix("", &buildings), None);
    }
}
