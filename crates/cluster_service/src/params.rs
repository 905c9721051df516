use geocluster::{AttributeFilter, BoundingBox, ClusterError, ClusterRequest, ValidationError};

/// Raw query pairs in request order. Keys may repeat.
pub type QueryParams = Vec<(String, String)>;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Last value wins for single-valued parameters.
fn param<'a>(query: &'a QueryParams, name: &str) -> Option<&'a str> {
    query
        .iter()
        .rev()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Every value of a list parameter, so `amendments=FIRST&amendments=FOURTH`
/// reads the same as `amendments=FIRST,FOURTH`.
fn list_param(query: &QueryParams, name: &str) -> Option<String> {
    let values: Vec<&str> = query
        .iter()
        .filter(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
        .collect();
    (!values.is_empty()).then(|| values.join(","))
}

/// `amendments`, `participants` and `state`.
pub fn attribute_filter(query: &QueryParams) -> AttributeFilter {
    AttributeFilter::from_params(
        list_param(query, "amendments").as_deref(),
        list_param(query, "participants").as_deref(),
        param(query, "state"),
    )
}

pub fn cluster_request(query: &QueryParams) -> Result<ClusterRequest, ClusterError> {
    ClusterRequest::from_params(
        param(query, "bbox"),
        param(query, "zoom"),
        attribute_filter(query),
    )
}

pub fn required_bbox(query: &QueryParams) -> Result<BoundingBox, ClusterError> {
    optional_bbox(query)?.ok_or_else(|| ValidationError::missing(BoundingBox::FIELD).into())
}

pub fn optional_bbox(query: &QueryParams) -> Result<Option<BoundingBox>, ClusterError> {
    match param(query, "bbox").map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => Ok(Some(raw.parse()?)),
    }
}

/// Zero-based page window over a result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub size: u32,
}

impl Page {
    pub fn offset(&self) -> usize {
        self.page as usize * self.size as usize
    }
}

/// `page` (default 0) and `size` (default 20, at most 100). Both errors are
/// reported together.
pub fn page(query: &QueryParams) -> Result<Page, ClusterError> {
    let mut errors = Vec::new();

    let page = match param(query, "page").map(str::trim) {
        None | Some("") => Some(0),
        Some(raw) => match raw.parse::<u32>() {
            Ok(page) => Some(page),
            Err(_) => {
                errors.push(ValidationError::new("page", format!("'{raw}' is not a non-negative integer")));
                None
            }
        },
    };

    let size = match param(query, "size").map(str::trim) {
        None | Some("") => Some(DEFAULT_PAGE_SIZE),
        Some(raw) => match raw.parse::<u32>() {
            Ok(size) if (1..=MAX_PAGE_SIZE).contains(&size) => Some(size),
            _ => {
                errors.push(ValidationError::new(
                    "size",
                    format!("'{raw}' is not an integer between 1 and {MAX_PAGE_SIZE}"),
                ));
                None
            }
        },
    };

    match (page, size) {
        (Some(page), Some(size)) => Ok(Page { page, size }),
        _ => Err(ClusterError::Validation(errors)),
    }
}

/// Case-insensitive title query, `None` when blank.
pub fn text_query(query: &QueryParams) -> Option<String> {
    param(query, "q")
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase)
}
