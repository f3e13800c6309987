//! Helpers that assemble class images byte by byte, so each test controls
//! exactly what ends up in the stream.
#![allow(dead_code)]

/// Constant pool under construction; entries are encoded immediately and
/// indices handed back, with Long/Double taking their two slots.
pub struct Pool {
    pub bytes: Vec<u8>,
    next: u16,
}

impl Pool {
    pub fn new() -> Pool {
        Pool {
            bytes: vec![],
            next: 1,
        }
    }

    /// constant_pool_count as it must appear in the header.
    pub fn count(&self) -> u16 {
        self.next
    }

    fn push(&mut self, encoded: &[u8], slots: u16) -> u16 {
        let index = self.next;
        self.bytes.extend_from_slice(encoded);
        self.next += slots;
        index
    }

    pub fn utf8(&mut self, s: &str) -> u16 {
        self.raw_utf8(s.as_bytes())
    }

    pub fn raw_utf8(&mut self, bytes: &[u8]) -> u16 {
        let mut encoded = vec![1u8];
        encoded.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        encoded.extend_from_slice(bytes);
        self.push(&encoded, 1)
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        let mut encoded = vec![3u8];
        encoded.extend_from_slice(&value.to_be_bytes());
        self.push(&encoded, 1)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        let mut encoded = vec![5u8];
        encoded.extend_from_slice(&value.to_be_bytes());
        self.push(&encoded, 2)
    }

    pub fn class(&mut self, name_index: u16) -> u16 {
        let mut encoded = vec![7u8];
        encoded.extend_from_slice(&name_index.to_be_bytes());
        self.push(&encoded, 1)
    }

    pub fn string(&mut self, utf8_index: u16) -> u16 {
        let mut encoded = vec![8u8];
        encoded.extend_from_slice(&utf8_index.to_be_bytes());
        self.push(&encoded, 1)
    }

    pub fn fieldref(&mut self, class_index: u16, nat_index: u16) -> u16 {
        self.ref_entry(9, class_index, nat_index)
    }

    pub fn methodref(&mut self, class_index: u16, nat_index: u16) -> u16 {
        self.ref_entry(10, class_index, nat_index)
    }

    pub fn interface_methodref(&mut self, class_index: u16, nat_index: u16) -> u16 {
        self.ref_entry(11, class_index, nat_index)
    }

    fn ref_entry(&mut self, tag: u8, class_index: u16, nat_index: u16) -> u16 {
        let mut encoded = vec![tag];
        encoded.extend_from_slice(&class_index.to_be_bytes());
        encoded.extend_from_slice(&nat_index.to_be_bytes());
        self.push(&encoded, 1)
    }

    pub fn name_and_type(&mut self, name_index: u16, descriptor_index: u16) -> u16 {
        let mut encoded = vec![12u8];
        encoded.extend_from_slice(&name_index.to_be_bytes());
        encoded.extend_from_slice(&descriptor_index.to_be_bytes());
        self.push(&encoded, 1)
    }

    pub fn method_handle(&mut self, kind: u8, reference_index: u16) -> u16 {
        let mut encoded = vec![15u8, kind];
        encoded.extend_from_slice(&reference_index.to_be_bytes());
        self.push(&encoded, 1)
    }
}

/// `attribute_info`: name index, length, body.
pub fn attribute(name_index: u16, body: &[u8]) -> Vec<u8> {
    let mut encoded = name_index.to_be_bytes().to_vec();
    encoded.extend_from_slice(&(body.len() as u32).to_be_bytes());
    encoded.extend_from_slice(body);
    encoded
}

/// A `Code` attribute body with no exception table and no nested attributes.
pub fn code_body(max_stack: u16, max_locals: u16, code: &[u8]) -> Vec<u8> {
    let mut body = max_stack.to_be_bytes().to_vec();
    body.extend_from_slice(&max_locals.to_be_bytes());
    body.extend_from_slice(&(code.len() as u32).to_be_bytes());
    body.extend_from_slice(code);
    body.extend_from_slice(&0u16.to_be_bytes()); // exception_table_length
    body.extend_from_slice(&0u16.to_be_bytes()); // attributes_count
    body
}

/// `field_info` / `method_info` share this encoding.
pub fn member(flags: u16, name_index: u16, descriptor_index: u16, attrs: &[Vec<u8>]) -> Vec<u8> {
    let mut encoded = flags.to_be_bytes().to_vec();
    encoded.extend_from_slice(&name_index.to_be_bytes());
    encoded.extend_from_slice(&descriptor_index.to_be_bytes());
    encoded.extend_from_slice(&(attrs.len() as u16).to_be_bytes());
    for attr in attrs {
        encoded.extend_from_slice(attr);
    }
    encoded
}

pub struct Image {
    pub pool: Pool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<Vec<u8>>,
    pub methods: Vec<Vec<u8>>,
    pub attributes: Vec<Vec<u8>>,
}

impl Image {
    pub fn build(&self) -> Vec<u8> {
        let mut image = 0xCAFEBABEu32.to_be_bytes().to_vec();
        image.extend_from_slice(&0u16.to_be_bytes()); // minor
        image.extend_from_slice(&55u16.to_be_bytes()); // major (Java 11)
        image.extend_from_slice(&self.pool.count().to_be_bytes());
        image.extend_from_slice(&self.pool.bytes);
        image.extend_from_slice(&self.access_flags.to_be_bytes());
        image.extend_from_slice(&self.this_class.to_be_bytes());
        image.extend_from_slice(&self.super_class.to_be_bytes());
        image.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for interface in &self.interfaces {
            image.extend_from_slice(&interface.to_be_bytes());
        }
        image.extend_from_slice(&(self.fields.len() as u16).to_be_bytes());
        for field in &self.fields {
            image.extend_from_slice(field);
        }
        image.extend_from_slice(&(self.methods.len() as u16).to_be_bytes());
        for method in &self.methods {
            image.extend_from_slice(method);
        }
        image.extend_from_slice(&(self.attributes.len() as u16).to_be_bytes());
        for attr in &self.attributes {
            image.extend_from_slice(attr);
        }
        image
    }
}

/// The smallest class this toolkit accepts: a named class extending
/// java/lang/Object with no members.
pub fn minimal_image(name: &str) -> Image {
    let mut pool = Pool::new();
    let this_name = pool.utf8(name);
    let this_class = pool.class(this_name);
    let super_name = pool.utf8("java/lang/Object");
    let super_class = pool.class(super_name);
    Image {
        pool,
        access_flags: 0x0021, // public super
        this_class,
        super_class,
        interfaces: vec![],
        fields: vec![],
        methods: vec![],
        attributes: vec![],
    }
}
