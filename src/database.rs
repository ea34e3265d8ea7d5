use crate::buildings::Building;
use crate::course_api::CourseSection;
use std::fs::OpenOptions;
use std::io::{Error, Read, Write};

const COURSE_DATABASE_NAME: &str = "./courses.json";
const BUILDING_DATABASE_NAME: &str = "./buildings.json";

pub fn load_course_database() -> Result<Vec<CourseSection>, Error> {
    let file = OpenOptions::new().read(true).open(COURSE_DATABASE_NAME);

    if file.is_err() {
        return Ok(Vec::new());
    } else {
        let mut file = file.unwrap();

        let mut data = String::new();
        file.read_to_string(&mut data)?;
        let sections: Vec<CourseSection> = from_slice_lenient(&data.as_bytes())?;
        Ok(sections)
    }
}

pub fn save_course_database(sections: &[CourseSection]) -> Result<(), Error> {
    let mut writer = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(COURSE_DATABASE_NAME)?;

    let serialized_output = serde_json::to_string(sections)?;

    writer.write_all(serialized_output.as_bytes())?;

    Ok(())
}

pub fn load_building_database() -> Result<Vec<Building>, Error> {
    let file = OpenOptions::new().read(true).open(BUILDING_DATABASE_NAME);

    if file.is_err() {
        return Ok(Vec::new());
    } else {
        let mut file = file.unwrap();

        let mut data = String::new();
        file.read_to_string(&mut data)?;
        let buildings: Vec<Building> = from_slice_lenient(&data.as_bytes())?;
        Ok(buildings)
    }
}

pub fn save_building_database(buildings: &[Building]) -> Result<(), Error> {
    let mut writer = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(BUILDING_DATABASE_NAME)?;

    let serialized_output = serde_json::to_string(buildings)?;

    writer.write_all(serialized_output.as_bytes())?;

    Ok(())
}

fn from_slice_lenient<'a, T: ::serde::Deserialize<'a>>(
    v: &'a [u8],
) -> Result<T, serde_json::Error> {
    let mut cur = std::io::Cursor::new(v);
    let mut de = serde_json::Deserializer::new(serde_json::de::IoRead::new(&mut cur));
    ::serde::Deserialize::deserialize(&mut de)
    // note the lack of: de.end()
}
