use convert_case::{Case, Casing};
use itertools::Itertools;

/// Builds a CloudFormation logical id from a construct path.
///
/// Every segment is converted to PascalCase and anything that is not
/// alphanumeric is dropped, e.g. `["apiFunction", "FunctionUrl"]` becomes
/// `ApiFunctionFunctionUrl`.
pub fn to_logical_id(path: &[&str]) -> String {
    path.iter()
        .map(|segment| segment.to_case(Case::Pascal))
        .join("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Joins construct ids into a path, e.g. `apiFunction/FunctionUrl`.
pub fn to_construct_path(path: &[&str]) -> String {
    path.iter().join("/")
}
