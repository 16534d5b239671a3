mod queue;
mod wrapped;

use trialwrap::{Arm, Trial};

/// A single-arm trial with one `x` parameter.
fn trial(index: u64) -> Trial {
    Trial::new(index).with_arm(Arm::new(format!("{index}_0")).with_param("x", 0.5))
}
