pub mod todo_list;
mod todo_list_tests;
