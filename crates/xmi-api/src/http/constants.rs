pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

pub(crate) const ROUTE_CONVERT: &str = "/v1/xmi";
pub(crate) const ROUTE_HEALTH: &str = "/health";
pub(crate) const ROUTE_METRICS: &str = "/metrics";

pub(crate) const FIELD_INPUT_ZIP: &str = "inputZip";
pub(crate) const FIELD_IR_FILE: &str = "irFile";
pub(crate) const FIELD_IR_JSON: &str = "irJson";
pub(crate) const FIELD_LANGUAGE: &str = "language";
pub(crate) const FIELD_RESULT_FORMAT: &str = "resultFormat";
pub(crate) const FIELD_REPO_URL: &str = "repoUrl";
pub(crate) const FIELD_NAME: &str = "name";
pub(crate) const FIELD_ASSOCIATIONS: &str = "associations";
pub(crate) const FIELD_DEPS: &str = "deps";
pub(crate) const FIELD_NESTED_TYPES: &str = "nestedTypes";
pub(crate) const FIELD_INCLUDE_ACCESSORS: &str = "includeAccessors";
pub(crate) const FIELD_INCLUDE_CONSTRUCTORS: &str = "includeConstructors";
pub(crate) const FIELD_FAIL_ON_UNRESOLVED: &str = "failOnUnresolved";
pub(crate) const FIELD_NO_STEREOTYPES: &str = "noStereotypes";
pub(crate) const FIELD_EXCLUDE: &str = "exclude";
