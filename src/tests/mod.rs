#[cfg(test)]
mod tracker_tests;
