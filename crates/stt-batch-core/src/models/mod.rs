pub mod job;

pub use job::{
    InitJobResponse, JobDescriptor, JobParameters, JobState, JobStatusResponse, StartJobRequest,
};
