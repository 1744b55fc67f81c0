// Training runs on an autodiff backend; evaluation and prediction use
// its inner backend through `AutodiffModule::valid()`.

use burn::tensor::backend::Backend;

#[cfg(not(feature = "wgpu"))]
pub type InnerBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type InnerBackend = burn::backend::Wgpu;

pub type TrainBackend = burn::backend::Autodiff<InnerBackend>;

pub type TrainDevice = <TrainBackend as Backend>::Device;

pub fn default_device() -> TrainDevice {
    TrainDevice::default()
}
