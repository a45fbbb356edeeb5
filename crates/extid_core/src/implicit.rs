//! Records that exist without being declared in any data file.
//!
//! Every model definition implies an `ir.model` row named
//! `<module>.model_<model with dots replaced by underscores>`.

use crate::record::Record;
use crate::scope::Scope;
use parking_lot::RwLock;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

/// Model of the rows implied by model definitions.
pub const MODEL_IR_MODEL: &str = "ir.model";

/// A producer of implicit records.
pub trait ImplicitRecordSource: Send + Sync {
    /// Streams every implicit record visible in `scope` until `consumer`
    /// breaks.
    fn process(
        &self,
        scope: &Scope,
        consumer: &mut dyn FnMut(Record) -> ControlFlow<()>,
    ) -> ControlFlow<()>;
}

/// A source with no records.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImplicitRecords;

impl ImplicitRecordSource for NoImplicitRecords {
    fn process(
        &self,
        _scope: &Scope,
        _consumer: &mut dyn FnMut(Record) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// A model definition found in source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDefinition {
    /// Dotted model name, e.g. `sale.order`.
    pub model: String,
    /// Module defining the model.
    pub module: String,
    /// File holding the definition; decides visibility.
    pub file: PathBuf,
}

impl ModelDefinition {
    /// Returns the identifier of the implied `ir.model` row.
    #[must_use]
    pub fn record_id(&self) -> String {
        format!("{}.model_{}", self.module, self.model.replace('.', "_"))
    }

    /// Returns the implied detached record.
    #[must_use]
    pub fn record(&self) -> Record {
        Record::new(
            self.record_id(),
            self.model.as_str(),
            MODEL_IR_MODEL,
            self.module.as_str(),
        )
    }
}

/// An in-memory registry of model definitions.
#[derive(Debug, Default)]
pub struct ModelCatalog {
    models: RwLock<Vec<ModelDefinition>>,
}

impl ModelCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `module` defines `model` in `file`.
    ///
    /// Defining the same model twice from the same file is a no-op.
    pub fn define(&self, model: impl Into<String>, module: impl Into<String>, file: impl Into<PathBuf>) {
        let def = ModelDefinition {
            model: model.into(),
            module: module.into(),
            file: file.into(),
        };
        let mut models = self.models.write();
        if !models.contains(&def) {
            models.push(def);
        }
    }

    /// Drops every definition made in `file`.
    pub fn forget_file(&self, file: &Path) {
        self.models.write().retain(|d| d.file != file);
    }

    /// Returns the number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    /// Returns true if nothing is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImplicitRecordSource for ModelCatalog {
    fn process(
        &self,
        scope: &Scope,
        consumer: &mut dyn FnMut(Record) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        let visible: Vec<ModelDefinition> = self
            .models
            .read()
            .iter()
            .filter(|d| scope.contains_path(&d.file))
            .cloned()
            .collect();
        for def in visible {
            consumer(def.record())?;
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ModelCatalog {
        let catalog = ModelCatalog::new();
        catalog.define("sale.order", "sale", "/addons/sale/models/sale_order.py");
        catalog.define("res.partner", "base", "/addons/base/models/res_partner.py");
        catalog
    }

    fn collect(source: &dyn ImplicitRecordSource, scope: &Scope) -> Vec<Record> {
        let mut out = Vec::new();
        let _ = source.process(scope, &mut |r| {
            out.push(r);
            ControlFlow::Continue(())
        });
        out
    }

    #[test]
    fn implied_record_shape() {
        let records = collect(&catalog(), &Scope::Everything);
        assert_eq!(records.len(), 2);
        let order = &records[0];
        assert_eq!(order.id(), "sale.model_sale_order");
        assert_eq!(order.name(), "sale.order");
        assert_eq!(order.model(), MODEL_IR_MODEL);
        assert_eq!(order.module(), "sale");
        assert!(!order.is_located());
    }

    #[test]
    fn visibility_follows_defining_file() {
        let records = collect(&catalog(), &Scope::roots(["/addons/base"]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), "base.model_res_partner");
    }

    #[test]
    fn consumer_can_stop() {
        let mut seen = 0;
        let flow = catalog().process(&Scope::Everything, &mut |_| {
            seen += 1;
            ControlFlow::Break(())
        });
        assert_eq!(flow, ControlFlow::Break(()));
        assert_eq!(seen, 1);
    }

    #[test]
    fn define_is_idempotent_and_forget_file() {
        let catalog = catalog();
        catalog.define("sale.order", "sale", "/addons/sale/models/sale_order.py");
        assert_eq!(catalog.len(), 2);
        catalog.forget_file(Path::new("/addons/sale/models/sale_order.py"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn empty_source() {
        assert!(collect(&NoImplicitRecords, &Scope::Everything).is_empty());
    }
}
