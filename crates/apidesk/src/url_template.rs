// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Endpoint URL templates: `{{name}}` and `:name` placeholders, query strings.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\{\{([^}]+)\}\}|:([A-Za-z_][A-Za-z0-9_]*)"));

fn placeholder_name<'a>(caps: &Captures<'a>) -> Option<&'a str> {
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

/// Substitute placeholders from `vars`, leaving unknown ones verbatim.
///
/// Substituted values are not rescanned.
pub fn replace_variables(template: &str, vars: &HashMap<String, String>) -> String {
    let Ok(re) = PLACEHOLDER.as_ref() else {
        return template.to_owned();
    };
    re.replace_all(template, |caps: &Captures<'_>| {
        placeholder_name(caps)
            .and_then(|name| vars.get(name))
            .cloned()
            .unwrap_or_else(|| caps[0].to_owned())
    })
    .into_owned()
}

/// Fill placeholders, then append the non-empty query parameters.
pub fn build_url(
    base: &str,
    path_params: &HashMap<String, String>,
    query_params: &BTreeMap<String, String>,
) -> String {
    let mut url = replace_variables(base, path_params);
    let query = query_params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&");
    if !query.is_empty() {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&query);
    }
    url
}

/// Placeholder names in first-seen order: `{{...}}` names, then `:name` names.
pub fn extract_path_params(url: &str) -> Vec<String> {
    let Ok(re) = PLACEHOLDER.as_ref() else {
        return Vec::new();
    };
    let mut braced = Vec::new();
    let mut colon = Vec::new();
    for caps in re.captures_iter(url) {
        if let Some(m) = caps.get(1) {
            braced.push(m.as_str().to_owned());
        } else if let Some(m) = caps.get(2) {
            colon.push(m.as_str().to_owned());
        }
    }
    let mut params: Vec<String> = Vec::with_capacity(braced.len() + colon.len());
    for name in braced.into_iter().chain(colon) {
        if !params.contains(&name) {
            params.push(name);
        }
    }
    params
}

/// Percent-encode a URI component, keeping the unreserved marks
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
pub fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
#[path = "url_template_tests.rs"]
mod tests;
