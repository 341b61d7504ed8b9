//! Field names and their classes

use std::fmt;

/// Class of a field; comparison operators are class-specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    /// mkey: compared with LT/GT/EQ, aggregated with MAX/MIN/AVG/SUM
    Numeric,
    /// skey: matched with IS
    Text,
}

impl FieldClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldClass::Numeric => "numeric",
            FieldClass::Text => "string",
        }
    }
}

impl fmt::Display for FieldClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every field a dataset record may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    // sections
    Uuid,
    Id,
    Title,
    Instructor,
    Dept,
    Year,
    Avg,
    Pass,
    Fail,
    Audit,
    // rooms
    Fullname,
    Shortname,
    Number,
    Name,
    Address,
    Lat,
    Lon,
    Seats,
    Type,
    Furniture,
    Href,
}

impl Field {
    pub const ALL: [Field; 21] = [
        Field::Uuid,
        Field::Id,
        Field::Title,
        Field::Instructor,
        Field::Dept,
        Field::Year,
        Field::Avg,
        Field::Pass,
        Field::Fail,
        Field::Audit,
        Field::Fullname,
        Field::Shortname,
        Field::Number,
        Field::Name,
        Field::Address,
        Field::Lat,
        Field::Lon,
        Field::Seats,
        Field::Type,
        Field::Furniture,
        Field::Href,
    ];

    /// Parses the field part of a dataset key (`avg` in `sections_avg`)
    pub fn parse(name: &str) -> Option<Field> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Field::Uuid => "uuid",
            Field::Id => "id",
            Field::Title => "title",
            Field::Instructor => "instructor",
            Field::Dept => "dept",
            Field::Year => "year",
            Field::Avg => "avg",
            Field::Pass => "pass",
            Field::Fail => "fail",
            Field::Audit => "audit",
            Field::Fullname => "fullname",
            Field::Shortname => "shortname",
            Field::Number => "number",
            Field::Name => "name",
            Field::Address => "address",
            Field::Lat => "lat",
            Field::Lon => "lon",
            Field::Seats => "seats",
            Field::Type => "type",
            Field::Furniture => "furniture",
            Field::Href => "href",
        }
    }

    pub fn class(&self) -> FieldClass {
        match self {
            Field::Year
            | Field::Avg
            | Field::Pass
            | Field::Fail
            | Field::Audit
            | Field::Lat
            | Field::Lon
            | Field::Seats => FieldClass::Numeric,
            _ => FieldClass::Text,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.class() == FieldClass::Numeric
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_every_field() {
        for field in Field::ALL {
            assert_eq!(Field::parse(field.name()), Some(field));
        }
        assert_eq!(Field::parse("subject"), None);
        assert_eq!(Field::parse(""), None);
    }

    #[test]
    fn test_classes_are_disjoint() {
        let numeric: Vec<_> = Field::ALL.iter().filter(|f| f.is_numeric()).collect();
        assert_eq!(numeric.len(), 8);
        assert_eq!(Field::Seats.class(), FieldClass::Numeric);
        assert_eq!(Field::Number.class(), FieldClass::Text);
        assert_eq!(Field::Uuid.class(), FieldClass::Text);
    }
}
