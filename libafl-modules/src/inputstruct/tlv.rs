use core::fmt;

use once_cell::unsync::OnceCell;

use crate::error::TlvError;

pub type Tag = u64;

/// Number of bytes the shortest var-number encoding of `n` takes.
pub fn var_number_len(n: u64) -> usize {
    match n {
        0..=252 => 1,
        253..=0xFFFF => 3,
        0x1_0000..=0xFFFF_FFFF => 5,
        _ => 9,
    }
}

pub fn write_var_number(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=252 => out.push(n as u8),
        253..=0xFFFF => {
            out.push(253);
            out.extend_from_slice(&(n as u16).to_be_bytes());
        }
        0x1_0000..=0xFFFF_FFFF => {
            out.push(254);
            out.extend_from_slice(&(n as u32).to_be_bytes());
        }
        _ => {
            out.push(255);
            out.extend_from_slice(&n.to_be_bytes());
        }
    }
}

/// Reads one var-number, returning it with the number of bytes consumed.
pub fn read_var_number(buf: &[u8]) -> Result<(u64, usize), TlvError> {
    let first = *buf.first().ok_or(TlvError::EmptyInput)?;
    let width = match first {
        0..=252 => return Ok((first as u64, 1)),
        253 => 2,
        254 => 4,
        255 => 8,
    };
    let rest = &buf[1..];
    if rest.len() < width {
        return Err(TlvError::TruncatedInput {
            needed: width,
            remaining: rest.len(),
        });
    }
    let n = rest[..width]
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | *b as u64);
    Ok((n, 1 + width))
}

pub fn encode(tag: Tag, value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(var_number_len(tag) + var_number_len(value.len() as u64) + value.len());
    encode_into(&mut out, tag, value);
    out
}

pub fn encode_into(out: &mut Vec<u8>, tag: Tag, value: &[u8]) {
    write_var_number(out, tag);
    write_var_number(out, value.len() as u64);
    out.extend_from_slice(value);
}

/// Concatenated full encodings of `children`, i.e. the value of their container.
pub fn concat_children<'a, C>(children: C) -> Vec<u8>
where
    C: IntoIterator<Item = &'a Element>,
{
    let mut value = Vec::new();
    for child in children {
        child.encode_into(&mut value);
    }
    value
}

/// Rebuild primitive: wraps the children's encodings with `tag` and a fresh length.
pub fn encode_container<'a, C>(tag: Tag, children: C) -> Vec<u8>
where
    C: IntoIterator<Item = &'a Element>,
{
    encode(tag, &concat_children(children))
}

/// One TLV element.
///
/// The value is the source of truth; the child list is parsed from it the
/// first time somebody asks and cached afterwards. An element whose value is
/// not a clean concatenation of TLV records simply has no children.
///
/// A parsed element remembers its tag and length bytes as they were on the
/// wire, so re-encoding an untouched element reproduces its input exactly,
/// non-minimal var-numbers included. Built elements use minimal encodings.
#[derive(Clone)]
pub struct Element {
    tag: Tag,
    value: Vec<u8>,
    header: Option<Vec<u8>>,
    children: OnceCell<Vec<Element>>,
}

impl Element {
    pub fn new(tag: Tag, value: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            value: value.into(),
            header: None,
            children: OnceCell::new(),
        }
    }

    pub fn container<'a, C>(tag: Tag, children: C) -> Self
    where
        C: IntoIterator<Item = &'a Element>,
    {
        Self::new(tag, concat_children(children))
    }

    /// Parses the first element of `buf`, returning it and the bytes consumed.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize), TlvError> {
        let (tag, tag_len) = read_var_number(buf)?;
        let (len, len_len) = read_var_number(&buf[tag_len..])?;
        let start = tag_len + len_len;
        let remaining = buf.len() - start;
        let len = usize::try_from(len).map_err(|_| TlvError::TruncatedInput {
            needed: usize::MAX,
            remaining,
        })?;
        if len > remaining {
            return Err(TlvError::TruncatedInput {
                needed: len,
                remaining,
            });
        }
        let mut element = Self::new(tag, &buf[start..start + len]);
        element.header = Some(buf[..start].to_vec());
        Ok((element, start + len))
    }

    /// Parses `buf` as a sequence of elements that must cover it exactly.
    pub fn parse_all(mut buf: &[u8]) -> Result<Vec<Self>, TlvError> {
        let mut elements = Vec::new();
        while !buf.is_empty() {
            let (element, used) = Self::parse(buf)?;
            elements.push(element);
            buf = &buf[used..];
        }
        Ok(elements)
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn value_len(&self) -> usize {
        self.value.len()
    }

    pub fn children(&self) -> &[Element] {
        self.children
            .get_or_init(|| Self::parse_all(&self.value).unwrap_or_default())
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    pub fn find(&self, tag: Tag) -> Option<usize> {
        self.children().iter().position(|c| c.tag == tag)
    }

    /// Positions of every child carrying `tag`, in order.
    pub fn occurrences(&self, tag: Tag) -> Vec<usize> {
        self.children()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.tag == tag)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn count(&self, tag: Tag) -> usize {
        self.children().iter().filter(|c| c.tag == tag).count()
    }

    pub fn encoded_len(&self) -> usize {
        let header = match &self.header {
            Some(header) => header.len(),
            None => var_number_len(self.tag) + var_number_len(self.value.len() as u64),
        };
        header + self.value.len()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match &self.header {
            Some(header) => {
                out.extend_from_slice(header);
                out.extend_from_slice(&self.value);
            }
            None => encode_into(out, self.tag, &self.value),
        }
    }

    pub fn with_value(&self, value: impl Into<Vec<u8>>) -> Self {
        Self::new(self.tag, value)
    }

    pub fn retagged(&self, tag: Tag) -> Self {
        Self::new(tag, self.value.clone())
    }

    /// Same container with the child at `index` swapped for `replacement`
    /// (or dropped when `replacement` is `None`). Other children keep their
    /// exact bytes.
    pub fn replace_child(&self, index: usize, replacement: Option<&Element>) -> Self {
        let mut value = Vec::with_capacity(self.value.len());
        for (i, child) in self.children().iter().enumerate() {
            if i == index {
                if let Some(r) = replacement {
                    r.encode_into(&mut value);
                }
            } else {
                child.encode_into(&mut value);
            }
        }
        Self::new(self.tag, value)
    }

    /// Same container with `child` inserted at `index`.
    pub fn insert_child(&self, index: usize, child: &Element) -> Self {
        let children = self.children();
        let index = index.min(children.len());
        let mut value = concat_children(&children[..index]);
        child.encode_into(&mut value);
        for c in &children[index..] {
            c.encode_into(&mut value);
        }
        Self::new(self.tag, value)
    }
}

// 只比较 tag 和 value, 不比较线上的长度编码
impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.value == other.value
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("len", &self.value.len())
            .field("value", &self.value)
            .finish()
    }
}
