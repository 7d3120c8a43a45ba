/// Two-letter state codes and their full names.
///
/// Codes missing from this table (territories, `"PR"`, typos) are treated as
/// unknown and never match a region filter.
pub const REGIONS: [(&str, &str); 49] = [
    ("OH", "Ohio"),
    ("WV", "West Virginia"),
    ("CA", "California"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("SC", "South Carolina"),
    ("NE", "Nebraska"),
    ("IA", "Iowa"),
    ("IL", "Illinois"),
    ("MO", "Missouri"),
    ("WI", "Wisconsin"),
    ("IN", "Indiana"),
    ("MI", "Michigan"),
    ("NJ", "New Jersey"),
    ("NY", "New York"),
    ("CT", "Connecticut"),
    ("MA", "Massachusetts"),
    ("RI", "Rhode Island"),
    ("NH", "New Hampshire"),
    ("PA", "Pennsylvania"),
    ("KY", "Kentucky"),
    ("MD", "Maryland"),
    ("VA", "Virginia"),
    ("DC", "District of Columbia"),
    ("DE", "Delaware"),
    ("TX", "Texas"),
    ("WA", "Washington"),
    ("OR", "Oregon"),
    ("AL", "Alabama"),
    ("NC", "North Carolina"),
    ("AZ", "Arizona"),
    ("TN", "Tennessee"),
    ("LA", "Louisiana"),
    ("MN", "Minnesota"),
    ("CO", "Colorado"),
    ("OK", "Oklahoma"),
    ("NV", "Nevada"),
    ("UT", "Utah"),
    ("KS", "Kansas"),
    ("NM", "New Mexico"),
    ("AR", "Arkansas"),
    ("MS", "Mississippi"),
    ("ME", "Maine"),
    ("VT", "Vermont"),
    ("WY", "Wyoming"),
    ("ID", "Idaho"),
    ("ND", "North Dakota"),
    ("MT", "Montana"),
    ("SD", "South Dakota"),
];

/// Map a state code to its full name. Lookup is exact (case-sensitive) after
/// trimming surrounding whitespace.
pub fn region_name(code: &str) -> Option<&'static str> {
    let code = code.trim();
    REGIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}
