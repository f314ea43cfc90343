pub mod julia;
