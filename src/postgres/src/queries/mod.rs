mod alert;
mod infrastructure;
mod position;
mod vessel;
