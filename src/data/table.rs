// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::data::{DataObject, DataObjectRef, ObjectMeta};

/// A named column of floating-point values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Tabular simulation data: equally long named columns plus optional
/// annotation sub-objects.
#[derive(Debug)]
pub struct Table {
    meta: ObjectMeta,
    columns: Vec<Column>,
    annotations: Vec<DataObjectRef>,
}

impl Table {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            meta: ObjectMeta::new(identifier),
            columns: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.set_column(name, values);
        self
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Mutable access to a column's values. Counts as a content change.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Vec<f64>> {
        let column = self.columns.iter_mut().find(|c| c.name == name)?;
        self.meta.bump_revision();
        Some(&mut column.values)
    }

    /// Adds or replaces a column.
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        self.meta.bump_revision();
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => column.values = values,
            None => self.columns.push(Column { name, values }),
        }
    }

    pub fn annotations(&self) -> &[DataObjectRef] {
        &self.annotations
    }

    /// Attaches an annotation. Only bumps the revision if the annotation is
    /// content rather than a decoration.
    pub fn add_annotation(&mut self, annotation: DataObjectRef) {
        if !annotation.is_decoration() {
            self.meta.bump_revision();
        }
        self.annotations.push(annotation);
    }
}

impl DataObject for Table {
    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }

    fn type_name(&self) -> &'static str {
        "Table"
    }

    fn duplicate(&self) -> Box<dyn DataObject> {
        Box::new(Table {
            meta: self.meta.duplicate(),
            columns: self.columns.clone(),
            annotations: self.annotations.clone(),
        })
    }

    fn sub_objects(&self) -> Vec<&DataObjectRef> {
        self.annotations.iter().collect()
    }

    fn sub_objects_mut(&mut self) -> Vec<&mut DataObjectRef> {
        self.annotations.iter_mut().collect()
    }
}

/// A text annotation. Labels are decorations of whatever references them.
#[derive(Debug)]
pub struct Label {
    meta: ObjectMeta,
    text: String,
}

impl Label {
    pub fn new(identifier: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            meta: ObjectMeta::new(identifier),
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.meta.bump_revision();
        self.text = text.into();
    }
}

impl DataObject for Label {
    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }

    fn type_name(&self) -> &'static str {
        "Label"
    }

    fn duplicate(&self) -> Box<dyn DataObject> {
        Box::new(Label {
            meta: self.meta.duplicate(),
            text: self.text.clone(),
        })
    }

    fn is_decoration(&self) -> bool {
        true
    }
}
