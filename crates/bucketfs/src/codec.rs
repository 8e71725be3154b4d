// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Notebook document encoding
//!
//! Notebooks are JSON objects carrying an integer `nbformat`. They are
//! written with one-space indentation and sorted keys so that saving an
//! unchanged document produces identical bytes.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use std::fmt::Debug;

/// Parses and serializes notebook documents
pub trait NotebookCodec: Send + Sync + Debug {
    fn parse(&self, data: &[u8]) -> Result<Value>;

    fn serialize(&self, doc: &Value) -> Result<Vec<u8>>;

    /// Document written by "new notebook"
    fn empty(&self) -> Value;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonNotebookCodec;

impl NotebookCodec for JsonNotebookCodec {
    fn parse(&self, data: &[u8]) -> Result<Value> {
        let doc: Value = serde_json::from_slice(data)
            .map_err(|e| Error::bad_format(format!("Unreadable Notebook: {e}")))?;
        match doc.get("nbformat") {
            Some(v) if v.is_u64() => Ok(doc),
            Some(_) => Err(Error::bad_format(
                "Unreadable Notebook: nbformat is not an integer",
            )),
            None => Err(Error::bad_format("Unreadable Notebook: missing nbformat")),
        }
    }

    fn serialize(&self, doc: &Value) -> Result<Vec<u8>> {
        if !doc.is_object() {
            return Err(Error::bad_format("Notebook must be a JSON object"));
        }
        let mut out = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b" "));
        doc.serialize(&mut ser)
            .map_err(|e| Error::bad_format(format!("Unwritable Notebook: {e}")))?;
        Ok(out)
    }

    fn empty(&self) -> Value {
        serde_json::json!({
            "cells": [],
            "metadata": {},
            "nbformat": 4,
            "nbformat_minor": 5,
        })
    }
}
