//! Models whose values are pushed in rather than derived.
//!
//! A [`SubModel`] either holds user data (no parent) or is the companion of a
//! primary model that fills it in while calculating itself. Companions refer
//! to their parent by name only.

use std::fmt;

use parking_lot::Mutex;

use crate::model::compute::ComputeContext;
use crate::model::kind::ElementKind;
use crate::model::{DisplayType, ModelCalculation, ModelHandle, Severity};
use crate::model_error::ModelError;
use crate::region::Region;

#[derive(Debug)]
pub struct SubModel {
    parent: Mutex<Option<String>>,
    display_type: DisplayType,
}

impl SubModel {
    /// A plain data model; its values only change through `set_values`.
    pub fn data() -> Self {
        Self {
            parent: Mutex::new(None),
            display_type: DisplayType::Scalar,
        }
    }

    /// A companion filled in by the model named `parent`.
    pub fn with_parent(parent: impl Into<String>) -> Self {
        Self {
            parent: Mutex::new(Some(parent.into())),
            display_type: DisplayType::Scalar,
        }
    }

    pub fn with_display_type(mut self, display_type: DisplayType) -> Self {
        self.display_type = display_type;
        self
    }
}

impl<K: ElementKind> ModelCalculation<K> for SubModel {
    fn dependencies(&self, _region: &Region) -> Vec<String> {
        self.parent.lock().iter().cloned().collect()
    }

    fn parent(&self) -> Option<String> {
        self.parent.lock().clone()
    }

    fn display_type(&self) -> DisplayType {
        self.display_type
    }

    /// Pulls the parent, which pushes this model's values as a side effect.
    ///
    /// # Errors
    /// - [`ModelError::MissingDependency`] if the parent no longer exists.
    /// - [`ModelError::ChangedDependency`] if the parent recalculated without
    ///   producing this model.
    fn calculate(&self, ctx: &mut ComputeContext<'_, K>) -> Result<(), ModelError> {
        let Some(parent) = self.parent.lock().clone() else {
            return Ok(());
        };
        let region = ctx.region();
        let Some(model) = K::registry(region).get(&parent) else {
            return Err(ctx.missing::<K>(&parent));
        };

        if !model.calculation().companions(region).iter().any(|c| c == ctx.name()) {
            // The parent name now belongs to a model that does not produce us;
            // keep the last values and stop following it.
            region.report(
                Severity::Info,
                format!(
                    "{} {} \"{}\" appears to have been redefined since last calculation of {} \"{}\", detaching",
                    ctx.location(),
                    K::KIND,
                    parent,
                    K::KIND,
                    ctx.name()
                ),
            );
            *self.parent.lock() = None;
            return Ok(());
        }

        model.calculate_values(region)?;
        if ctx.model_is_fresh() {
            return Ok(());
        }
        // The parent was already fresh, so it did not push anything.
        model.set_stale();
        model.calculate_values(region)?;
        if ctx.model_is_fresh() {
            Ok(())
        } else {
            Err(ctx.changed_dependency(&parent))
        }
    }

    fn serialize(&self, model: &ModelHandle<'_, K>, out: &mut dyn fmt::Write) -> fmt::Result {
        if let Some(parent) = self.parent.lock().as_deref() {
            return write!(out, "DATAPARENT \"{parent}\"");
        }
        let data = model.model().stored_data();
        match data.uniform_value() {
            Some(v) => write!(out, "UNIFORM {v}"),
            None => {
                out.write_str("DATA")?;
                for v in data.values().iter() {
                    write!(out, "\n{v}")?;
                }
                Ok(())
            }
        }
    }
}
