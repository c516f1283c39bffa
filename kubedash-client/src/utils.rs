/// How a field is read: sort keys compare as strings, so numbers get padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorMode {
    Sort,
    Filter,
}

pub fn pad_key(n: usize) -> String {
    format!("{:020}", n)
}
