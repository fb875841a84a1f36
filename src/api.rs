pub mod leneda;
