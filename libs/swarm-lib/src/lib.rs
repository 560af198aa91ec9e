//! Docker Swarm management client
//!
//! The [`OrchestratorClient`] trait is what the rotation protocol talks to;
//! [`DockerClient`] implements it against the Docker Engine API.

mod client;
mod docker;
mod error;
mod models;

pub use client::OrchestratorClient;
pub use docker::{DockerClient, DockerConfig, DockerHost, DEFAULT_API_VERSION, DEFAULT_DOCKER_HOST};
pub use error::SwarmError;
pub use models::{
    ContainerSpec, Labels, ObjectVersion, SecretFile, SecretReference, SecretSpec, ServiceSpec,
    SwarmSecret, SwarmService, TaskTemplate,
};
