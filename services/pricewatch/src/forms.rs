//! Form input handling and validation
//!
//! Everything here runs before a request is sent; a rejected form never
//! reaches the backend.

use crate::api::Product;
use crate::DashboardError;

/// Placeholder shown in place of a stored Telegram credential
pub const SECRET_MASK: &str = "••••••••••••••••";

/// Listing site the watcher knows how to scrape
pub const EXPECTED_LISTING_DOMAIN: &str = "vaurioajoneuvo.fi";

const INVALID_PRODUCT: &str = "Please fill in all required fields with valid values";

/// Raw product form input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductForm {
    pub url: String,
    pub target_price: String,
    pub name: String,
}

impl ProductForm {
    /// Pre-fill the form from an existing product
    pub fn from_product(product: &Product) -> Self {
        Self {
            url: product.url.clone(),
            target_price: product.target_price.to_string(),
            name: product.name.clone().unwrap_or_default(),
        }
    }

    /// Validate the input into a product
    pub fn validate(&self) -> crate::Result<Product> {
        let url = self.url.trim();
        let target_price = leading_float(&self.target_price)
            .ok_or_else(|| DashboardError::Validation(INVALID_PRODUCT.to_string()))?;

        if url.is_empty() || !target_price.is_finite() || target_price <= 0.0 {
            return Err(DashboardError::Validation(INVALID_PRODUCT.to_string()));
        }

        let name = self.name.trim();
        Ok(Product {
            url: url.to_string(),
            target_price,
            name: (!name.is_empty()).then(|| name.to_string()),
        })
    }
}

/// Number at the start of the input, ignoring whatever follows it
/// (`"3000 €"` is 3000)
fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'-' | b'+')));
    let whole = digits_from(end);
    end += whole;
    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits_from(end + 1);
        if whole > 0 || fraction > 0 {
            end += 1 + fraction;
        }
    }
    if whole == 0 && fraction == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'-' | b'+')));
        let exponent = digits_from(end + 1 + sign);
        if exponent > 0 {
            end += 1 + sign + exponent;
        }
    }

    s[..end].parse().ok()
}

/// Whether a URL points at the listing site the watcher understands
pub fn is_expected_listing(url: &str) -> bool {
    url.contains(EXPECTED_LISTING_DOMAIN)
}

/// Validate a new interval spec entered by the user
pub fn validate_interval(input: &str) -> crate::Result<String> {
    let interval = input.trim();
    if interval.is_empty() {
        return Err(DashboardError::Validation(
            "Please enter an interval".to_string(),
        ));
    }
    Ok(interval.to_string())
}

/// An input field that hides a stored secret behind [`SECRET_MASK`].
///
/// Masking only hides the value from casual view; the real value is still
/// held here and sent back verbatim when the field is left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaskedField {
    shown: String,
    actual: String,
}

impl MaskedField {
    pub fn new(actual: Option<&str>) -> Self {
        let actual = actual.unwrap_or_default().to_string();
        let shown = if actual.is_empty() {
            String::new()
        } else {
            SECRET_MASK.to_string()
        };
        Self { shown, actual }
    }

    pub fn shown(&self) -> &str {
        &self.shown
    }

    pub fn is_masked(&self) -> bool {
        self.shown == SECRET_MASK
    }

    /// Focusing a masked field clears it for fresh input
    pub fn focus(&mut self) {
        if self.is_masked() {
            self.shown.clear();
        }
    }

    pub fn input(&mut self, text: &str) {
        self.shown = text.to_string();
    }

    /// Value to submit: the stored value when untouched, otherwise the trimmed input
    pub fn submitted(&self) -> String {
        if self.is_masked() {
            self.actual.clone()
        } else {
            self.shown.trim().to_string()
        }
    }
}

/// Tracks whether the product form adds a new product or edits an existing one
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductEditor {
    pub form: ProductForm,
    editing: Option<usize>,
}

/// What a product form submission should do
#[derive(Debug, Clone, PartialEq)]
pub enum ProductSubmission {
    Add(Product),
    Update(usize, Product),
}

impl ProductEditor {
    pub fn editing(&self) -> Option<usize> {
        self.editing
    }

    /// Load a product into the form; the next submit updates it
    pub fn begin_edit(&mut self, idx: usize, product: &Product) {
        self.form = ProductForm::from_product(product);
        self.editing = Some(idx);
    }

    /// Leave edit mode and reset the form
    pub fn cancel(&mut self) {
        self.editing = None;
        self.form = ProductForm::default();
    }

    pub fn submission(&self) -> crate::Result<ProductSubmission> {
        let product = self.form.validate()?;
        Ok(match self.editing {
            Some(idx) => ProductSubmission::Update(idx, product),
            None => ProductSubmission::Add(product),
        })
    }
}
