mod label;

pub use self::label::Label;
