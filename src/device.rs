//! Devices: named collections of regions sharing device-level parameters.

use std::collections::BTreeMap;
use std::sync::Arc;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::model::ElementKind;
use crate::model_error::ModelError;
use crate::region::{MeshDescription, ParameterSet, ParameterValue, Region, RegionBuilder};

#[derive(Debug)]
pub struct Device {
    name: String,
    regions: Vec<Region>,
    parameters: BTreeMap<String, ParameterValue>,
}

impl Device {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regions: Vec::new(),
            parameters: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds a region from `mesh` and adds it; the region inherits every
    /// device parameter set so far.
    ///
    /// # Errors
    /// [`ModelError::InvalidMesh`] if the mesh is rejected or the device
    /// already has a region of that name.
    pub fn add_region(&mut self, name: &str, mesh: MeshDescription) -> Result<&Region, ModelError> {
        if self.region(name).is_some() {
            return Err(ModelError::InvalidMesh(format!(
                "device \"{}\" already has a region \"{name}\"",
                self.name
            )));
        }
        let region = RegionBuilder::from_description(self.name.as_str(), name, mesh).finalize()?;
        for (key, value) in &self.parameters {
            region.set_inherited_parameter(key, value.clone());
        }
        self.regions.push(region);
        Ok(&self.regions[self.regions.len() - 1])
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name() == name)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterValue> {
        self.parameters.get(name)
    }

    /// Sets a device-level parameter, seen by every region that does not
    /// override it.
    pub fn set_parameter(&mut self, name: &str, value: impl Into<ParameterValue>) {
        let value = value.into();
        for region in &self.regions {
            region.set_inherited_parameter(name, value.clone());
        }
        self.parameters.insert(name.to_string(), value);
    }

    /// Applies a parameter set: `global` entries at device level, `regions`
    /// entries on the named regions. Entries for unknown regions are skipped
    /// with a warning.
    pub fn apply(&mut self, parameters: &ParameterSet) {
        for (name, value) in &parameters.global {
            self.set_parameter(name, value.clone());
        }
        for (region_name, values) in &parameters.regions {
            let Some(region) = self.region(region_name) else {
                log::warn!(
                    "parameters given for region \"{region_name}\", which device \"{}\" does not have",
                    self.name
                );
                continue;
            };
            for (name, value) in values {
                region.set_parameter(name, value.clone());
            }
        }
    }

    /// Values of the model `name` of kind `K` in every region, in region
    /// order.
    pub fn evaluate<K: ElementKind>(&self, name: &str) -> Vec<Result<Arc<[f64]>, ModelError>> {
        self.regions.iter().map(|r| evaluate_in::<K>(r, name)).collect()
    }

    /// Like [`evaluate`](Self::evaluate), one region per worker.
    #[cfg(feature = "rayon")]
    pub fn par_evaluate<K: ElementKind>(&self, name: &str) -> Vec<Result<Arc<[f64]>, ModelError>> {
        self.regions.par_iter().map(|r| evaluate_in::<K>(r, name)).collect()
    }
}

fn evaluate_in<K: ElementKind>(region: &Region, name: &str) -> Result<Arc<[f64]>, ModelError> {
    region
        .get_model::<K>(name)
        .ok_or_else(|| ModelError::UnknownModel {
            location: region.location(),
            kind: K::KIND,
            model: name.to_string(),
        })?
        .scalar_values()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;

    fn mesh() -> MeshDescription {
        MeshDescription {
            nodes: vec![[0.0; 3], [1.0, 0.0, 0.0]],
            edges: vec![[0, 1]],
            ..Default::default()
        }
    }

    #[test]
    fn region_parameters_override_device() {
        let mut device = Device::new("dev");
        device.set_parameter("T", 300.0);
        device.add_region("r0", mesh()).unwrap();
        device.add_region("r1", mesh()).unwrap();

        let mut set = ParameterSet::default();
        set.regions
            .entry("r1".into())
            .or_default()
            .insert("T".into(), ParameterValue::Number(350.0));
        device.apply(&set);

        assert_eq!(device.region("r0").unwrap().number_parameter("T"), Some(300.0));
        assert_eq!(device.region("r1").unwrap().number_parameter("T"), Some(350.0));
    }

    #[test]
    fn duplicate_region_is_rejected() {
        let mut device = Device::new("dev");
        device.add_region("r", mesh()).unwrap();
        assert!(matches!(device.add_region("r", mesh()), Err(ModelError::InvalidMesh(_))));
    }

    #[test]
    fn evaluate_reports_missing_models_per_region() {
        let mut device = Device::new("dev");
        device.add_region("r", mesh()).unwrap();
        let results = device.evaluate::<NodeKind>("Potential");
        assert!(matches!(results[0], Err(ModelError::UnknownModel { .. })));
    }
}
