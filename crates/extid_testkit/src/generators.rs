//! Property-based test generators using proptest.
//!
//! Identifiers, names and models are drawn from alphabets that need no
//! escaping in either markup or tabular files.

use crate::fixtures::{odoo_xml, record_xml};
use extid_core::{Record, RecordSubtype};
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Strategy for module technical names.
pub fn module_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for the local part of an identifier.
pub fn local_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,23}").expect("Invalid regex")
}

/// Strategy for `module.local_name` identifiers.
pub fn qualified_id_strategy() -> impl Strategy<Value = String> {
    (module_name_strategy(), local_name_strategy()).prop_map(|(m, l)| format!("{m}.{l}"))
}

/// Strategy for model names such as `res.partner`.
pub fn model_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{2,8}(\\.[a-z]{2,8}){1,2}").expect("Invalid regex")
}

/// Strategy for display names.
pub fn display_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9]{1,16}").expect("Invalid regex")
}

/// Strategy for detached records declared by `module`.
pub fn record_strategy(module: String) -> impl Strategy<Value = Record> {
    (
        local_name_strategy(),
        display_name_strategy(),
        model_strategy(),
        any::<bool>(),
    )
        .prop_map(move |(local, name, model, qweb)| {
            Record::new(format!("{module}.{local}"), name, model, module.clone())
                .with_subtype(qweb.then_some(RecordSubtype::Qweb))
        })
}

/// Strategy for the rows of a data file: local name to (model, name).
///
/// Keys are unique, so every row declares a distinct identifier.
pub fn declarations_strategy(
    max: usize,
) -> impl Strategy<Value = BTreeMap<String, (String, String)>> {
    prop::collection::btree_map(
        local_name_strategy(),
        (model_strategy(), display_name_strategy()),
        1..=max.max(1),
    )
}

/// Renders declarations as a markup document of `<record>` elements.
pub fn declarations_xml(declarations: &BTreeMap<String, (String, String)>) -> String {
    let body: Vec<String> = declarations
        .iter()
        .map(|(local, (model, name))| record_xml(local, model, name))
        .collect();
    odoo_xml(&body.join("\n"))
}

/// Renders local names and display names as a tabular file body.
pub fn declarations_csv(declarations: &BTreeMap<String, (String, String)>) -> String {
    let mut out = String::from("id,name\n");
    for (local, (_, name)) in declarations {
        out.push_str(local);
        out.push(',');
        out.push_str(name);
        out.push('\n');
    }
    out
}
