//! # CRD Generator
//!
//! Prints the CustomResourceDefinitions of the built-in generators as a
//! multi-document YAML stream.
//!
//! ```bash
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use anyhow::Result;
use kube::core::CustomResourceExt;
use secret_generator_controller::crd::{Fake, Uuid};

fn main() -> Result<()> {
    for crd in [Fake::crd(), Uuid::crd()] {
        println!("---");
        print!("{}", serde_yaml::to_string(&crd)?);
    }
    Ok(())
}
