mod activity_sweeper;

pub use activity_sweeper::ActivitySweeper;
