//! Locations — structured position decorations for GMOD nodes.
//!
//! A location string is a compact code such as `11FIPU`: an optional leading
//! number followed by single letters drawn from the release's alphabet, in
//! ascending ASCII order, at most one per group (side, vertical, transverse,
//! longitudinal). Parsing validates against the alphabet loaded for the VIS
//! release and reports precise, ordered errors.

use std::collections::HashMap;

use crate::dto::LocationsDto;
use crate::vis_version::VisVersion;
use crate::{Error, Result};

// ============================================================================
// Location
// ============================================================================

/// A validated location in canonical string form.
///
/// Two locations are equal iff their strings are equal; `Display` returns the
/// accepted input byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    value: String,
}

impl Location {
    pub(crate) fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

// ============================================================================
// Groups
// ============================================================================

/// The five groups a location character can belong to.
///
/// `H` and `V` are accepted by the grammar but belong to no group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationGroup {
    Number = 0,
    Side = 1,
    Vertical = 2,
    Transverse = 3,
    Longitudinal = 4,
}

/// One valid location code character with its display metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RelativeLocation {
    code: char,
    name: String,
    definition: Option<String>,
    location: Location,
}

impl RelativeLocation {
    pub fn code(&self) -> char {
        self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    pub fn location(&self) -> &Location {
        &self.location
    }
}

/// At most one character per group; index 0 (Number) is never used because
/// `N` carries no letter.
#[derive(Default)]
struct LocationCharDict {
    table: [Option<char>; 4],
}

impl LocationCharDict {
    /// Record `value` for `group`; on conflict return the existing character.
    fn try_add(&mut self, group: LocationGroup, value: char) -> std::result::Result<(), char> {
        let slot = &mut self.table[group as usize - 1];
        match slot {
            Some(existing) => Err(*existing),
            None => {
                *slot = Some(value);
                Ok(())
            }
        }
    }
}

// ============================================================================
// Validation results & errors
// ============================================================================

/// Outcome classes for location validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationValidationResult {
    Invalid,
    InvalidCode,
    InvalidOrder,
    NullOrWhiteSpace,
}

impl LocationValidationResult {
    fn name(self) -> &'static str {
        match self {
            LocationValidationResult::Invalid => "Invalid",
            LocationValidationResult::InvalidCode => "InvalidCode",
            LocationValidationResult::InvalidOrder => "InvalidOrder",
            LocationValidationResult::NullOrWhiteSpace => "NullOrWhiteSpace",
        }
    }
}

/// Ordered error record produced by `try_parse_with_errors`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsingErrors {
    entries: Vec<(String, String)>,
}

impl ParsingErrors {
    pub(crate) fn add(&mut self, result: LocationValidationResult, message: impl Into<String>) {
        self.entries.push((result.name().to_string(), message.into()));
    }

    pub fn has_errors(&self) -> bool {
        !self.entries.is_empty()
    }

    /// `(kind, message)` pairs in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, m)| (t.as_str(), m.as_str()))
    }

    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|(_, m)| m.as_str()).collect()
    }
}

impl std::fmt::Display for ParsingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (kind, message)) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{kind}: {message}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Locations
// ============================================================================

/// The location alphabet of one VIS release, with parsing.
#[derive(Debug, Clone)]
pub struct Locations {
    vis_version: VisVersion,
    location_codes: Vec<char>,
    relative_locations: Vec<RelativeLocation>,
    reversed_groups: HashMap<char, LocationGroup>,
    groups: HashMap<LocationGroup, Vec<RelativeLocation>>,
}

impl Locations {
    /// Build from the locations DTO of a release.
    pub fn new(vis_version: VisVersion, dto: &LocationsDto) -> Result<Self> {
        let mut location_codes = Vec::with_capacity(dto.items.len());
        let mut relative_locations = Vec::with_capacity(dto.items.len());
        let mut reversed_groups = HashMap::new();
        let mut groups: HashMap<LocationGroup, Vec<RelativeLocation>> = HashMap::new();

        for item in &dto.items {
            location_codes.push(item.code);

            let relative = RelativeLocation {
                code: item.code,
                name: item.name.clone(),
                definition: item.definition.clone(),
                location: Location::new(item.code.to_string()),
            };
            relative_locations.push(relative.clone());

            if item.code == 'H' || item.code == 'V' {
                continue;
            }

            let group = match item.code {
                'N' => LocationGroup::Number,
                'P' | 'C' | 'S' => LocationGroup::Side,
                'U' | 'M' | 'L' => LocationGroup::Vertical,
                'I' | 'O' => LocationGroup::Transverse,
                'F' | 'A' => LocationGroup::Longitudinal,
                other => {
                    return Err(Error::Decode(format!(
                        "unsupported location code: '{other}'"
                    )))
                }
            };

            groups.entry(group).or_default();
            if group == LocationGroup::Number {
                continue;
            }

            reversed_groups.insert(item.code, group);
            groups.get_mut(&group).unwrap().push(relative);
        }

        Ok(Self {
            vis_version,
            location_codes,
            relative_locations,
            reversed_groups,
            groups,
        })
    }

    pub fn vis_version(&self) -> VisVersion {
        self.vis_version
    }

    pub fn relative_locations(&self) -> &[RelativeLocation] {
        &self.relative_locations
    }

    pub fn groups(&self) -> &HashMap<LocationGroup, Vec<RelativeLocation>> {
        &self.groups
    }

    // ------------------------------------------------------------------------
    // Parsing
    // ------------------------------------------------------------------------

    /// Parse a location string, failing with [`Error::InvalidLocation`].
    pub fn parse(&self, value: &str) -> Result<Location> {
        let mut errors = ParsingErrors::default();
        self.try_parse_internal(value, &mut errors)
            .ok_or_else(|| Error::InvalidLocation(value.to_string()))
    }

    /// Parse a location string, returning `None` on failure.
    pub fn try_parse(&self, value: &str) -> Option<Location> {
        let mut errors = ParsingErrors::default();
        self.try_parse_internal(value, &mut errors)
    }

    /// Parse a location string, collecting the error record on failure.
    pub fn try_parse_with_errors(&self, value: &str) -> (Option<Location>, ParsingErrors) {
        let mut errors = ParsingErrors::default();
        let location = self.try_parse_internal(value, &mut errors);
        (location, errors)
    }

    fn try_parse_internal(&self, span: &str, errors: &mut ParsingErrors) -> Option<Location> {
        if span.is_empty() || span.chars().all(char::is_whitespace) {
            errors.add(
                LocationValidationResult::NullOrWhiteSpace,
                format!("Invalid location: contains only whitespace in '{span}'"),
            );
            return None;
        }

        let mut char_dict = LocationCharDict::default();

        let mut prev_digit_index: Option<usize> = None;
        let mut chars_start_index: Option<usize> = None;
        let mut prev_char: Option<char> = None;

        for (i, ch) in span.chars().enumerate() {
            if ch.is_ascii_digit() {
                if chars_start_index.is_some() {
                    errors.add(
                        LocationValidationResult::InvalidOrder,
                        format!(
                            "Invalid location: numeric part must come before location codes in '{span}'"
                        ),
                    );
                    return None;
                }

                if let Some(prev) = prev_digit_index {
                    if prev != i - 1 {
                        errors.add(
                            LocationValidationResult::Invalid,
                            format!(
                                "Invalid location: cannot have multiple separated digits in '{span}'"
                            ),
                        );
                        return None;
                    }
                }

                prev_digit_index = Some(i);
                prev_char = Some(ch);
                continue;
            }

            let first_letter = chars_start_index.is_none();
            if first_letter {
                chars_start_index = Some(i);
            }

            // `N` names the number group and is never a letter in a location.
            let valid = ch != 'N' && self.location_codes.contains(&ch);
            if !valid {
                let invalid_chars = span
                    .chars()
                    .filter(|c| {
                        !c.is_ascii_digit() && (*c == 'N' || !self.location_codes.contains(c))
                    })
                    .map(|c| format!("'{c}'"))
                    .collect::<Vec<_>>()
                    .join(",");

                errors.add(
                    LocationValidationResult::InvalidCode,
                    format!(
                        "Invalid location code: '{span}' with invalid location code(s): {invalid_chars}"
                    ),
                );
                return None;
            }

            if !first_letter {
                if let Some(prev) = prev_char {
                    if !prev.is_ascii_digit() && ch < prev {
                        errors.add(
                            LocationValidationResult::InvalidOrder,
                            format!(
                                "Invalid location: codes must be alphabetically sorted in location: '{span}'"
                            ),
                        );
                        return None;
                    }
                }
            }

            if let Some(&group) = self.reversed_groups.get(&ch) {
                if let Err(existing) = char_dict.try_add(group, ch) {
                    errors.add(
                        LocationValidationResult::InvalidOrder,
                        format!(
                            "Duplicate location code from the same group in '{span}': {existing} and {ch}"
                        ),
                    );
                    return None;
                }
            }

            prev_char = Some(ch);
        }

        Some(Location::new(span))
    }
}

// ============================================================================
// LocationBuilder
// ============================================================================

/// Fluent builder for location values over a release's alphabet.
///
/// Unlike the parser, the builder rejects numbers below 1.
#[derive(Debug, Clone)]
pub struct LocationBuilder {
    number: Option<u32>,
    side: Option<char>,
    vertical: Option<char>,
    transverse: Option<char>,
    longitudinal: Option<char>,
    reversed_groups: HashMap<char, LocationGroup>,
}

impl LocationBuilder {
    pub fn create(locations: &Locations) -> Self {
        Self {
            number: None,
            side: None,
            vertical: None,
            transverse: None,
            longitudinal: None,
            reversed_groups: locations.reversed_groups.clone(),
        }
    }

    pub fn number(&self) -> Option<u32> {
        self.number
    }

    pub fn side(&self) -> Option<char> {
        self.side
    }

    pub fn vertical(&self) -> Option<char> {
        self.vertical
    }

    pub fn transverse(&self) -> Option<char> {
        self.transverse
    }

    pub fn longitudinal(&self) -> Option<char> {
        self.longitudinal
    }

    pub fn with_number(mut self, number: u32) -> Result<Self> {
        if number < 1 {
            return Err(Error::InvalidInput(format!(
                "location number must be greater than 0, got {number}"
            )));
        }
        self.number = Some(number);
        Ok(self)
    }

    pub fn with_side(self, side: char) -> Result<Self> {
        self.with_group_value(LocationGroup::Side, side)
    }

    pub fn with_vertical(self, vertical: char) -> Result<Self> {
        self.with_group_value(LocationGroup::Vertical, vertical)
    }

    pub fn with_transverse(self, transverse: char) -> Result<Self> {
        self.with_group_value(LocationGroup::Transverse, transverse)
    }

    pub fn with_longitudinal(self, longitudinal: char) -> Result<Self> {
        self.with_group_value(LocationGroup::Longitudinal, longitudinal)
    }

    /// Set whatever group `value` belongs to.
    pub fn with_value(self, value: char) -> Result<Self> {
        let group = *self.reversed_groups.get(&value).ok_or_else(|| {
            Error::InvalidInput(format!("'{value}' is not a valid location code"))
        })?;
        self.with_group_value(group, value)
    }

    /// Absorb every component of an already-built location.
    pub fn with_location(mut self, location: &Location) -> Result<Self> {
        let value = location.value();

        let digits: String = value.chars().take_while(char::is_ascii_digit).collect();
        if !digits.is_empty() {
            let number: u32 = digits
                .parse()
                .map_err(|_| Error::InvalidInput(format!("invalid location number in '{value}'")))?;
            self = self.with_number(number)?;
        }

        for ch in value.chars().skip(digits.len()) {
            self = match self.reversed_groups.get(&ch) {
                Some(_) => self.with_value(ch)?,
                // H and V carry no group and are not representable here.
                None => {
                    return Err(Error::InvalidInput(format!(
                        "'{ch}' is not assignable to a location group"
                    )))
                }
            };
        }

        Ok(self)
    }

    fn with_group_value(mut self, group: LocationGroup, value: char) -> Result<Self> {
        match self.reversed_groups.get(&value) {
            Some(&actual) if actual == group => {}
            _ => {
                return Err(Error::InvalidInput(format!(
                    "'{value}' is not a valid {group:?} location code"
                )))
            }
        }

        match group {
            LocationGroup::Side => self.side = Some(value),
            LocationGroup::Vertical => self.vertical = Some(value),
            LocationGroup::Transverse => self.transverse = Some(value),
            LocationGroup::Longitudinal => self.longitudinal = Some(value),
            LocationGroup::Number => {
                return Err(Error::InvalidInput(
                    "the number group carries no character value".to_string(),
                ))
            }
        }
        Ok(self)
    }

    pub fn build(&self) -> Location {
        Location::new(self.to_string())
    }
}

impl std::fmt::Display for LocationBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut letters: Vec<char> = [self.side, self.vertical, self.transverse, self.longitudinal]
            .into_iter()
            .flatten()
            .collect();
        letters.sort_unstable();

        if let Some(number) = self.number {
            write!(f, "{number}")?;
        }
        for letter in letters {
            write!(f, "{letter}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::RelativeLocationDto;

    fn test_locations() -> Locations {
        // The production alphabet for VIS 3-4a.
        let codes = [
            ('N', "number"),
            ('A', "aft"),
            ('C', "centre"),
            ('F', "forward"),
            ('H', "hanging"),
            ('I', "inner"),
            ('L', "lower"),
            ('M', "middle"),
            ('O', "outer"),
            ('P', "port"),
            ('S', "starboard"),
            ('U', "upper"),
            ('V', "vertical"),
        ];
        let dto = LocationsDto {
            vis_release: "3.4a".to_string(),
            items: codes
                .iter()
                .map(|&(code, name)| RelativeLocationDto {
                    code,
                    name: name.to_string(),
                    definition: None,
                })
                .collect(),
        };
        Locations::new(VisVersion::V3_4a, &dto).unwrap()
    }

    #[test]
    fn test_parse_valid() {
        let locations = test_locations();

        for value in ["11FIPU", "FIPU", "1", "F", "11", "CL", "AS", "H", "HV"] {
            let location = locations.parse(value).unwrap();
            assert_eq!(location.to_string(), value, "round-trip of '{value}'");
        }
    }

    #[test]
    fn test_parse_invalid_order() {
        let locations = test_locations();

        let (location, errors) = locations.try_parse_with_errors("UP");
        assert!(location.is_none());
        let messages = errors.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("alphabetically sorted"), "{}", messages[0]);
    }

    #[test]
    fn test_parse_digits_after_letters() {
        let locations = test_locations();

        for value in ["F1", "1F1"] {
            let (location, errors) = locations.try_parse_with_errors(value);
            assert!(location.is_none());
            assert!(errors.messages()[0].contains("numeric part must come before"));
        }
    }

    #[test]
    fn test_parse_invalid_code() {
        let locations = test_locations();

        let (location, errors) = locations.try_parse_with_errors("1X");
        assert!(location.is_none());
        let messages = errors.messages();
        assert!(messages[0].contains("invalid location code(s): 'X'"), "{}", messages[0]);

        // N is the number marker, never a letter.
        let (location, errors) = locations.try_parse_with_errors("N");
        assert!(location.is_none());
        assert!(errors.messages()[0].contains("'N'"));
    }

    #[test]
    fn test_parse_duplicate_group() {
        let locations = test_locations();

        let (location, errors) = locations.try_parse_with_errors("PS");
        assert!(location.is_none());
        assert!(errors.messages()[0].contains("Duplicate location code from the same group"));
    }

    #[test]
    fn test_parse_empty() {
        let locations = test_locations();

        for value in ["", "  ", "\t"] {
            let (location, errors) = locations.try_parse_with_errors(value);
            assert!(location.is_none());
            assert_eq!(errors.iter().next().unwrap().0, "NullOrWhiteSpace");
        }
        assert!(matches!(locations.parse(""), Err(Error::InvalidLocation(_))));
    }

    #[test]
    fn test_groups() {
        let locations = test_locations();
        let groups = locations.groups();

        assert_eq!(groups.len(), 5);
        assert_eq!(groups[&LocationGroup::Side].len(), 3);
        assert_eq!(groups[&LocationGroup::Number].len(), 0);
        // H and V belong to no group.
        assert!(!locations
            .groups()
            .values()
            .flatten()
            .any(|r| r.code() == 'H' || r.code() == 'V'));
    }

    #[test]
    fn test_builder() {
        let locations = test_locations();

        let builder = LocationBuilder::create(&locations)
            .with_number(11)
            .unwrap()
            .with_side('P')
            .unwrap()
            .with_transverse('I')
            .unwrap()
            .with_longitudinal('F')
            .unwrap()
            .with_value('U')
            .unwrap();

        assert_eq!(builder.to_string(), "11FIPU");
        assert_eq!(builder.number(), Some(11));
        assert_eq!(builder.side(), Some('P'));
        assert_eq!(builder.vertical(), Some('U'));

        assert!(builder.clone().with_value('X').is_err());
        assert!(builder.clone().with_number(0).is_err());
        assert!(builder.clone().with_side('A').is_err());
        assert!(builder.clone().with_value('a').is_err());

        assert_eq!(builder.build(), locations.parse("11FIPU").unwrap());

        // Re-absorb and override.
        let rebuilt = LocationBuilder::create(&locations)
            .with_location(&builder.build())
            .unwrap()
            .with_value('S')
            .unwrap()
            .with_number(2)
            .unwrap();
        assert_eq!(rebuilt.to_string(), "2FISU");
    }
}
