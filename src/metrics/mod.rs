pub mod training;
pub mod summary;

pub use training::TrainingStatistics;
pub use summary::Summary;
