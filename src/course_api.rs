use ::serde::*;
use escaper::decode_html;
use lazy_static::*;
use log::{error, info};
use rand::{thread_rng, Rng};
use regex::Regex;
use reqwest::header::*;
use reqwest::Client;
use std::error::Error;
use std::fs::OpenOptions;
use std::io::Read;
use std::time::Duration;

const WEBREG_COURSES_URL: &str = "https://webreg.usc.edu/Courses?Program=";
const WEBREG_DEPARTMENTS_URL: &str = "https://webreg.usc.edu/Departments";
const COOKIES_FILE: &str = "./cookies.txt";

// Webreg serves the full section table to the mobile user agent only
const SCRAPER_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Mobile Safari/537.36";

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref DEPARTMENT_CODE_RE: Regex = Regex::new(r"Courses\?Program=([A-Z]+)").unwrap();
}

/// One scraped section row. The time, days and location fields keep the raw
/// registrar text; the availability engine owns all interpretation.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CourseSection {
    course_id: String,
    course_name: String,
    description: String,
    section: String,
    section_type: String,
    units: String,
    registered_count: i64,
    time: String,
    days: String,
    location: String,
}

impl CourseSection {
    pub fn new(
        course_id: String,
        course_name: String,
        description: String,
        section: String,
        section_type: String,
        units: String,
        registered_count: i64,
        time: String,
        days: String,
        location: String,
    ) -> CourseSection {
        CourseSection {
            course_id,
            course_name,
            description,
            section,
            section_type,
            units,
            registered_count,
            time,
            days,
            location,
        }
    }

    pub fn get_course_id(&self) -> &String {
        &self.course_id
    }

    pub fn get_course_name(&self) -> &String {
        &self.course_name
    }

    pub fn get_description(&self) -> &String {
        &self.description
    }

    pub fn get_section(&self) -> &String {
        &self.section
    }

    pub fn get_section_type(&self) -> &String {
        &self.section_type
    }

    pub fn get_units(&self) -> &String {
        &self.units
    }

    pub fn get_registered_count(&self) -> i64 {
        self.registered_count
    }

    pub fn get_time(&self) -> &String {
        &self.time
    }

    pub fn get_days(&self) -> &String {
        &self.days
    }

    pub fn get_location(&self) -> &String {
        &self.location
    }
}

pub fn get_rows_clean(raw_text: &str) -> Option<Vec<String>> {
    // Split at start of table and end, taking only the rows
    let body = raw_text.split_at(raw_text.find("<tbody>")?).1;
    let body = body.split_at(body.find("</tbody>")?).0;

    Some(body.lines().map(|row| row.trim().to_string()).collect())
}

pub fn group_rows_as_sections(rows: Vec<String>) -> Vec<Vec<String>> {
    let mut sections = Vec::new();
    let mut current_section = Vec::new();

    for row in rows {
        if row.contains("<td") && row.trim() != "" {
            current_section.push(strip_cell(&row));
        } else if row.contains("</tr>") {
            if !current_section.is_empty() {
                sections.push(current_section);
            }

            current_section = Vec::new();
        }
    }

    sections
}

fn strip_cell(row: &str) -> String {
    let stripped = TAG_RE.replace_all(row, "").trim().to_string();

    decode_html(&stripped).unwrap_or(stripped)
}

/// Cell order on a section row: course, section, type, units, time, days,
/// registered, location. Rows that do not fill the table (header and note
/// rows) are dropped here rather than failing the page.
pub fn html_group_to_section(group: Vec<String>) -> Option<CourseSection> {
    if group.len() < 8 {
        return None;
    }

    let (course_id, course_name) = match group[0].split_once(':') {
        Some((id, name)) => (id.trim().to_string(), name.trim().to_string()),
        None => (group[0].trim().to_string(), String::new()),
    };

    if course_id.is_empty() {
        return None;
    }

    // "25 of 60" -> 25
    let registered_count = group[6]
        .split_whitespace()
        .next()
        .unwrap_or("0")
        .parse::<i64>()
        .unwrap_or(0);

    Some(CourseSection::new(
        course_id,
        course_name,
        String::new(),
        group[1].trim().to_string(),
        group[2].trim().to_string(),
        group[3].trim().to_string(),
        registered_count,
        group[4].trim().to_string(),
        group[5].trim().to_string(),
        group[7].trim().to_string(),
    ))
}

pub fn parse_course_html(html: &str) -> Vec<CourseSection> {
    let rows = match get_rows_clean(html) {
        Some(rows) => rows,
        None => return Vec::new(),
    };

    group_rows_as_sections(rows)
        .into_iter()
        .filter_map(html_group_to_section)
        .collect()
}

pub fn extract_department_codes(html: &str) -> Vec<String> {
    let mut codes: Vec<String> = Vec::new();

    for captures in DEPARTMENT_CODE_RE.captures_iter(html) {
        let code = captures[1].to_string();

        if !codes.contains(&code) {
            codes.push(code);
        }
    }

    codes
}

/// Registration pages sit behind a login, so requests replay a session
/// cookie saved by the browser ("name=value; name=value" on one line).
pub fn load_cookie_header(path: &str) -> Result<String, std::io::Error> {
    let mut file = OpenOptions::new().read(true).open(path)?;

    let mut data = String::new();
    file.read_to_string(&mut data)?;

    Ok(data.trim().to_string())
}

async fn get_department_html(
    client: &Client,
    cookie_header: &str,
    code: &str,
) -> reqwest::Result<String> {
    let response = client
        .get(format!("{}{}", WEBREG_COURSES_URL, code))
        .header(REFERER, WEBREG_DEPARTMENTS_URL)
        .header(COOKIE, cookie_header)
        .send()
        .await?;

    response.text().await
}

/// Walks every department the registration site lists and collects the
/// parsed section rows. A department that fails to fetch is logged and
/// skipped; the sweep continues.
pub async fn scrape_all_sections() -> Result<Vec<CourseSection>, Box<dyn Error>> {
    let cookie_header = load_cookie_header(COOKIES_FILE)?;

    let client = Client::builder().user_agent(SCRAPER_USER_AGENT).build()?;

    let departments_html = client
        .get(WEBREG_DEPARTMENTS_URL)
        .header(COOKIE, &cookie_header)
        .send()
        .await?
        .text()
        .await?;

    let codes = extract_department_codes(&departments_html);
    info!("Found {} department codes", codes.len());

    let mut sections: Vec<CourseSection> = Vec::new();

    for code in codes {
        match get_department_html(&client, &cookie_header, &code).await {
            Ok(html) => {
                let parsed = parse_course_html(&html);
                info!("{}: {} sections", code, parsed.len());
                sections.extend(parsed);
            }
            Err(error) => error!("Failed to fetch {}: {}", code, error),
        }

        // Jitter between departments to avoid rate limiting
        let pause = thread_rng().gen_range(1..=3);
        tokio::time::sleep(Duration::from_secs(pause)).await;
    }

    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = "<html><body><h4>Course Search Results</h4>\n<table><tbody>\n<tr>\n<td>CSCI-104: Data Structures and Object Oriented Design</td>\n<td>29907R</td>\n<td>Lecture</td>\n<td>4.0</td>\n<td>10:00am-11:50am</td>\n<td>MWF</td>\n<td>25 of 60</td>\n<td>THH101</td>\n</tr>\n<tr>\n<td>AME-201: Statics &amp; Dynamics</td>\n<td>28805D</td>\n<td>Lecture</td>\n<td>3.0</td>\n<td>12:00pm-01:50pm</td>\n<td>TTh</td>\n<td>40 of 45</td>\n<td>SGM124</td>\n</tr>\n<tr>\n<td>&nbsp;</td>\n</tr>\n</tbody></table></body></html>";

    #[test]
    fn parses_section_rows() {
        let sections = parse_course_html(SAMPLE_PAGE);

        assert_eq!(sections.len(), 2);

        let first = &sections[0];
        assert_eq!(first.get_course_id(), "CSCI-104");
        assert_eq!(
            first.get_course_name(),
            "Data Structures and Object Oriented Design"
        );
        assert_eq!(first.get_section(), "29907R");
        assert_eq!(first.get_section_type(), "Lecture");
        assert_eq!(first.get_units(), "4.0");
        assert_eq!(first.get_registered_count(), 25);
        assert_eq!(first.get_time(), "10:00am-11:50am");
        assert_eq!(first.get_days(), "MWF");
        assert_eq!(first.get_location(), "THH101");
    }

    #[test]
    fn decodes_entities_in_names() {
        let sections = parse_course_html(SAMPLE_PAGE);

        assert_eq!(sections[1].get_course_name(), "Statics & Dynamics");
    }

    #[test]
    fn missing_table_parses_as_empty() {
        assert!(parse_course_html("<html><body>No results</body></html>").is_empty());
        assert!(parse_course_html("").is_empty());
    }

    #[test]
    fn short_rows_are_dropped() {
        let rows = vec![
            "<td>Orphan cell</td>".to_string(),
            "</tr>".to_string(),
        ];

        let groups = group_rows_as_sections(rows);
        assert_eq!(groups.len(), 1);
        assert_eq!(html_group_to_section(groups[0].clone()), None);
    }

    #[test]
    fn department_codes_dedup_in_order() {
        let html = "<a href=\"/Courses?Program=CSCI\">CS</a>\n<a href=\"/Courses?Program=AME\">AME</a>\n<a href=\"/Courses?Program=CSCI\">CS again</a>";

        assert_eq!(extract_department_codes(html), vec!["CSCI", "AME"]);
    }
}
