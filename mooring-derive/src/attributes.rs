//! Attribute parsing utilities

use syn::{Attribute, ExprLit, Field, Lit};

/// Extract table name from struct attributes
pub fn extract_table_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    extract_string(attrs, "table_name")
}

/// Attributes recognised on a record field
#[derive(Debug, Default)]
pub struct ColumnAttributes {
    pub is_primary_key: bool,
    pub is_auto_increment: bool,
    pub is_skipped: bool,
    pub column_name: Option<String>,
}

/// Parse all column attributes from a field
pub fn parse_column_attributes(field: &Field) -> syn::Result<ColumnAttributes> {
    let column_name = extract_string(&field.attrs, "column_name")?;
    if let Some(name) = &column_name {
        if name.is_empty() {
            return Err(syn::Error::new_spanned(
                field,
                "column_name cannot be an empty string",
            ));
        }
    }

    Ok(ColumnAttributes {
        is_primary_key: has_attribute(&field.attrs, "primary_key"),
        is_auto_increment: has_attribute(&field.attrs, "auto_increment"),
        is_skipped: has_attribute(&field.attrs, "skip"),
        column_name,
    })
}

fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

/// Read `#[name = "value"]`, rejecting any other shape of the attribute
fn extract_string(attrs: &[Attribute], name: &str) -> syn::Result<Option<String>> {
    for attr in attrs {
        if !attr.path().is_ident(name) {
            continue;
        }
        let meta = attr.meta.require_name_value()?;
        if let syn::Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) = &meta.value
        {
            return Ok(Some(s.value()));
        }
        return Err(syn::Error::new_spanned(
            &meta.value,
            format!("expected `#[{name} = \"...\"]`"),
        ));
    }
    Ok(None)
}
