// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transforms the flat `user_metadata` map into the nested shape the
//! external conversion library expects: list-valued
//! fields become arrays, and fields are grouped under `NWBFile` / `Subject`
//! the way the conversion library's metadata dict is structured.

use std::collections::HashMap;

use nwb_core::schema::lookup;
use nwb_core::MetadataValue;
use serde_json::{json, Map, Value};

const SUBJECT_FIELDS: &[&str] = &["subject_id", "species", "age", "sex", "genotype", "strain"];

pub fn transform(user_metadata: &HashMap<String, MetadataValue>) -> Value {
    let mut nwbfile = Map::new();
    let mut subject = Map::new();

    for (field_name, value) in user_metadata {
        let is_list_valued = lookup(field_name).map(|f| f.list_valued).unwrap_or(false);
        let json_value = to_json_value(value, is_list_valued);

        if SUBJECT_FIELDS.contains(&field_name.as_str()) {
            let key = if field_name == "subject_id" { "subject_id".to_string() } else { field_name.clone() };
            subject.insert(key, json_value);
        } else {
            nwbfile.insert(field_name.clone(), json_value);
        }
    }

    json!({ "NWBFile": nwbfile, "Subject": subject })
}

fn to_json_value(value: &MetadataValue, list_valued: bool) -> Value {
    match value {
        MetadataValue::Text(s) if list_valued => json!([s]),
        MetadataValue::Text(s) => json!(s),
        MetadataValue::List(items) => json!(items),
        MetadataValue::Number(n) => json!(n),
    }
}
