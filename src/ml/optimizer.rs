// ============================================================
// Layer 5 — Optimizers
// ============================================================
// SGD:       θ = θ − lr·g
// Momentum:  v = μ·v + g;  θ = θ − lr·v             (no dampening)
// Adam:      Kingma & Ba (2015), burn defaults
// RMSProp:   Tieleman & Hinton (2012), burn defaults
//
// The learning rate is not part of these configs; the trainer passes
// it to every `step` call.

use burn::optim::{momentum::MomentumConfig, AdamConfig, RmsPropConfig, SgdConfig};

pub fn sgd() -> SgdConfig {
    SgdConfig::new()
}

pub fn momentum(mu: f64) -> SgdConfig {
    let momentum = MomentumConfig::new().with_momentum(mu).with_dampening(0.0);
    SgdConfig::new().with_momentum(Some(momentum))
}

pub fn adam() -> AdamConfig {
    AdamConfig::new().with_epsilon(1e-7)
}

pub fn rms_prop() -> RmsPropConfig {
    RmsPropConfig::new()
}
