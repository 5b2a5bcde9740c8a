use anyhow::{anyhow, Result};
use candle_core::Tensor;
use candle_nn::VarMap;
use std::collections::HashMap;
use verge_core::AgentError;

/// Snapshot of the variables of a [`VarMap`], keyed by variable name.
///
/// Tensors are copied, so later updates of the variables do not affect a snapshot.
#[derive(Clone, Debug)]
pub struct NamedTensors {
    pub named_tensors: HashMap<String, Tensor>,
}

impl NamedTensors {
    /// Copies the variables of a [`VarMap`].
    pub fn copy_from(vs: &VarMap) -> Result<Self> {
        let data = vs.data().lock().map_err(|_| anyhow!("VarMap lock poisoned"))?;
        let mut named_tensors = HashMap::with_capacity(data.len());
        for (k, v) in data.iter() {
            named_tensors.insert(k.clone(), v.as_tensor().detach().copy()?);
        }
        Ok(Self { named_tensors })
    }

    /// Copies the named tensors to the variables of a [`VarMap`].
    ///
    /// Every variable must have a tensor of the same shape; otherwise nothing is
    /// written.
    pub fn copy_to(&self, vs: &VarMap) -> Result<()> {
        let data = vs.data().lock().map_err(|_| anyhow!("VarMap lock poisoned"))?;
        for (k, v) in data.iter() {
            let src = self
                .named_tensors
                .get(k)
                .ok_or_else(|| AgentError::MissingParameter(k.clone()))?;
            if src.dims() != v.dims() {
                return Err(AgentError::ShapeMismatch {
                    name: k.clone(),
                    expected: v.dims().to_vec(),
                    found: src.dims().to_vec(),
                }
                .into());
            }
        }
        for (k, v) in data.iter() {
            let src = &self.named_tensors[k];
            v.set(&src.to_device(v.device())?.to_dtype(v.dtype())?)?;
        }
        Ok(())
    }

    /// Returns the tensor of the given name.
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.named_tensors.get(name)
    }

    /// Returns the values of the given tensor as a flat vector.
    pub fn to_vec(&self, name: &str) -> Result<Vec<f32>> {
        let t = self
            .get(name)
            .ok_or_else(|| AgentError::MissingParameter(name.to_string()))?;
        Ok(t.flatten_all()?.to_vec1::<f32>()?)
    }

    /// Names of the tensors.
    pub fn names(&self) -> Vec<&String> {
        let mut names: Vec<_> = self.named_tensors.keys().collect();
        names.sort();
        names
    }

    /// The number of tensors.
    pub fn len(&self) -> usize {
        self.named_tensors.len()
    }

    /// Returns `true` if there is no tensor.
    pub fn is_empty(&self) -> bool {
        self.named_tensors.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::NamedTensors;
    use anyhow::Result;
    use candle_core::{DType, Device, Tensor};
    use candle_nn::{Init, VarMap};

    fn varmap(shape: (usize, usize)) -> Result<VarMap> {
        let vm = VarMap::new();
        let init = Init::Randn {
            mean: 0.0,
            stdev: 1.0,
        };
        vm.get(shape, "layer1.weight", init, DType::F32, &Device::Cpu)?;
        Ok(vm)
    }

    #[test]
    fn test_snapshot_is_a_copy() -> Result<()> {
        let vm = varmap((2, 3))?;
        let snapshot = NamedTensors::copy_from(&vm)?;
        let before = snapshot.to_vec("layer1.weight")?;

        vm.data()
            .lock()
            .unwrap()
            .get("layer1.weight")
            .unwrap()
            .set(&Tensor::zeros((2, 3), DType::F32, &Device::Cpu)?)?;
        assert_eq!(snapshot.to_vec("layer1.weight")?, before);

        snapshot.copy_to(&vm)?;
        let restored = NamedTensors::copy_from(&vm)?;
        assert_eq!(restored.to_vec("layer1.weight")?, before);
        Ok(())
    }

    #[test]
    fn test_copy_to_rejects_other_shapes() -> Result<()> {
        let src = NamedTensors::copy_from(&varmap((2, 3))?)?;
        let dest = varmap((3, 2))?;
        let before = NamedTensors::copy_from(&dest)?.to_vec("layer1.weight")?;

        assert!(src.copy_to(&dest).is_err());
        assert_eq!(
            NamedTensors::copy_from(&dest)?.to_vec("layer1.weight")?,
            before
        );
        Ok(())
    }
}
