mod basic_tests;
mod goal_engine;
