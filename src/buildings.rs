use ::serde::*;
use lazy_static::*;
use log::info;
use regex::Regex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fs;

const DIRECTORY_API_URL: &str =
    "https://api.concept3d.com/categories/53722?map=1928&children&key=0001085cc708b9cef47080f064612ca5";
const BUILDING_LIST_NAME: &str = "./buildings.txt";

lazy_static! {
    static ref BUILDING_CODE_RE: Regex = Regex::new(r"\(([A-Z]+)\)").unwrap();
    static ref LEADING_INDEX_RE: Regex = Regex::new(r"^\d+\s+").unwrap();
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Building {
    name: String,
    code: String,
}

impl Building {
    pub fn new(name: String, code: String) -> Building {
        Building { name, code }
    }

    pub fn get_name(&self) -> &String {
        &self.name
    }

    pub fn get_code(&self) -> &String {
        &self.code
    }
}

/// Code -> display-name lookup used to validate and repair extracted room
/// prefixes. Read-only once built; an empty directory is valid and simply
/// disables prefix correction and building rankings.
#[derive(Clone, Debug, Default)]
pub struct BuildingDirectory {
    names: HashMap<String, String>,
    codes: HashSet<String>,
}

impl BuildingDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_from_buildings(buildings: &[Building]) -> Self {
        let mut directory = Self::new();

        for building in buildings {
            directory
                .names
                .insert(building.code.clone(), building.name.clone());
            directory.codes.insert(building.code.clone());
        }

        directory
    }

    pub fn get_name(&self, code: &str) -> Option<&String> {
        self.names.get(code)
    }

    pub fn code_set(&self) -> &HashSet<String> {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// The campus map lists buildings as "Mark Taper Hall of Humanities (THH)";
/// the code is the last all-caps parenthesized token.
pub fn extract_building_code(name: &str) -> Option<String> {
    BUILDING_CODE_RE
        .captures_iter(name)
        .last()
        .map(|captures| captures[1].to_string())
}

pub fn clean_building_name(name: &str) -> String {
    let trimmed = name.trim();

    match extract_building_code(trimmed) {
        Some(code) => {
            let suffix = format!("({})", code);

            if trimmed.ends_with(&suffix) {
                trimmed[..trimmed.len() - suffix.len()].trim_end().to_string()
            } else {
                trimmed.to_string()
            }
        }
        None => trimmed.to_string(),
    }
}

fn insert_shortest(buildings: &mut HashMap<String, String>, code: String, name: String) {
    let entry = buildings.entry(code).or_insert_with(|| name.clone());

    if name.len() < entry.len() {
        *entry = name;
    }
}

pub async fn fetch_building_directory() -> Result<HashMap<String, String>, Box<dyn Error>> {
    let response = reqwest::get(DIRECTORY_API_URL).await?;
    let data: Value = response.json().await?;

    let mut buildings: HashMap<String, String> = HashMap::new();

    for item in data["children"]["locations"].as_array().unwrap_or(&vec![]) {
        let name = item["name"].as_str().unwrap_or("").trim();

        if let Some(code) = extract_building_code(name) {
            insert_shortest(&mut buildings, code, clean_building_name(name));
        }
    }

    info!("Fetched {} buildings from the map API", buildings.len());

    Ok(buildings)
}

/// Optional hand-maintained list, one building per line as
/// "123  Mark Taper Hall of Humanities (THH)". Missing file is fine.
pub fn load_building_list(path: &str) -> HashMap<String, String> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(_) => return HashMap::new(),
    };

    let mut buildings: HashMap<String, String> = HashMap::new();

    for line in text.lines() {
        let cleaned = LEADING_INDEX_RE.replace(line.trim(), "").to_string();

        if let Some(code) = extract_building_code(&cleaned) {
            insert_shortest(&mut buildings, code, clean_building_name(&cleaned));
        }
    }

    buildings
}

/// Merges both sources, keeping the shortest name per code, sorted by code.
pub fn merge_building_sources(
    api_buildings: HashMap<String, String>,
    local_buildings: HashMap<String, String>,
) -> Vec<Building> {
    let mut merged = api_buildings;

    for (code, name) in local_buildings {
        insert_shortest(&mut merged, code, name);
    }

    let mut list: Vec<Building> = merged
        .into_iter()
        .map(|(code, name)| Building::new(name, code))
        .collect();

    list.sort_by(|a, b| a.code.cmp(&b.code));

    list
}

pub async fn update_building_directory() -> Result<Vec<Building>, Box<dyn Error>> {
    let api_buildings = fetch_building_directory().await?;
    let local_buildings = load_building_list(BUILDING_LIST_NAME);

    Ok(merge_building_sources(api_buildings, local_buildings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_last_caps_parenthetical() {
        assert_eq!(
            extract_building_code("Mark Taper Hall of Humanities (THH)"),
            Some("THH".to_string())
        );
        assert_eq!(
            extract_building_code("Annex (North) Building (ANX)"),
            Some("ANX".to_string())
        );
        assert_eq!(extract_building_code("Doheny Library"), None);
        assert_eq!(extract_building_code("Parking (lot 2)"), None);
    }

    #[test]
    fn cleaning_strips_only_the_code() {
        assert_eq!(
            clean_building_name("Mark Taper Hall of Humanities (THH)"),
            "Mark Taper Hall of Humanities"
        );
        assert_eq!(
            clean_building_name("Annex (North) Building (ANX)"),
            "Annex (North) Building"
        );
        assert_eq!(clean_building_name("  Doheny Library  "), "Doheny Library");
    }

    #[test]
    fn merge_keeps_shortest_name_and_sorts() {
        let mut api = HashMap::new();
        api.insert("THH".to_string(), "Mark Taper Hall of Humanities".to_string());
        api.insert("SGM".to_string(), "Seeley G. Mudd Building".to_string());

        let mut local = HashMap::new();
        local.insert("THH".to_string(), "Taper Hall".to_string());
        local.insert("GFS".to_string(), "Grace Ford Salvatori Hall".to_string());

        let merged = merge_building_sources(api, local);

        let codes: Vec<&String> = merged.iter().map(|b| b.get_code()).collect();
        assert_eq!(codes, vec!["GFS", "SGM", "THH"]);

        let taper = merged.iter().find(|b| b.get_code() == "THH").unwrap();
        assert_eq!(taper.get_name(), "Taper Hall");
    }

    #[test]
    fn directory_lookup_and_degradation() {
        let buildings = vec![
            Building::new("Taper Hall".to_string(), "THH".to_string()),
        ];

        let directory = BuildingDirectory::new_from_buildings(&buildings);
        assert_eq!(directory.len(), 1);
        assert_eq!(directory.get_name("THH"), Some(&"Taper Hall".to_string()));
        assert!(directory.code_set().contains("THH"));

        let empty = BuildingDirectory::new();
        assert!(empty.is_empty());
        assert_eq!(empty.get_name("THH"), None);
    }
}
