use std::ffi::c_void;
use thiserror::Error;

pub struct GeometryBuilder<'a> {
    attributes: Vec<VertexAttribute>,
    data: &'a [f32],
    indices: Option<&'a [u32]>,
}

impl<'a> GeometryBuilder<'a> {
    pub fn new(data: &'a [f32]) -> Self {
        Self {
            data,
            attributes: Vec::new(),
            indices: None,
        }
    }

    pub fn with_attribute(mut self, attr: VertexAttribute) -> Self {
        self.attributes.push(attr);
        self
    }

    /// Draw through an element buffer instead of the raw vertex order.
    pub fn with_indices(mut self, indices: &'a [u32]) -> Self {
        self.indices = Some(indices);
        self
    }

    fn stride(&self) -> usize {
        self.attributes.iter().map(|a| a.size()).sum()
    }

    /// Checks the layout and returns the vertex count, without touching GL.
    fn validate(&self) -> Result<usize, GBError> {
        let total_len = self.stride();

        if total_len == 0 {
            return Err(GBError::NoAttributes);
        }

        if self.data.len() % total_len != 0 {
            return Err(GBError::InvalidDataLength);
        }

        let vertices = self.data.len() / total_len;

        if let Some(indices) = self.indices {
            if let Some(&index) = indices.iter().find(|i| **i as usize >= vertices) {
                return Err(GBError::IndexOutOfRange { index, vertices });
            }
        }

        Ok(vertices)
    }

    pub fn build(self) -> Result<Geometry, GBError> {
        let vertices = self.validate()?;
        let total_len = self.stride();

        let mut vao = 0;
        let mut vbo = 0;
        let mut ebo = None;

        unsafe {
            gl::GenVertexArrays(1, (&mut vao) as *mut u32);
            gl::GenBuffers(1, (&mut vbo) as *mut u32);

            gl::BindVertexArray(vao);
            gl::BindBuffer(gl::ARRAY_BUFFER, vbo);

            gl::BufferData(
                gl::ARRAY_BUFFER,
                std::mem::size_of_val(self.data) as isize,
                self.data.as_ptr() as *const c_void,
                gl::STATIC_DRAW,
            );

            if let Some(indices) = self.indices {
                let mut id = 0;
                gl::GenBuffers(1, (&mut id) as *mut u32);
                // the element buffer binding is recorded in the vao
                gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, id);
                gl::BufferData(
                    gl::ELEMENT_ARRAY_BUFFER,
                    std::mem::size_of_val(indices) as isize,
                    indices.as_ptr() as *const c_void,
                    gl::STATIC_DRAW,
                );
                ebo = Some(id);
            }

            let mut offset = 0;

            for (i, attr) in self.attributes.iter().enumerate() {
                gl::VertexAttribPointer(
                    i as u32,
                    attr.size() as i32,
                    gl::FLOAT,
                    gl::FALSE,
                    (total_len * std::mem::size_of::<f32>()) as i32,
                    (offset * std::mem::size_of::<f32>()) as *const c_void,
                );
                offset += attr.size();
                gl::EnableVertexAttribArray(i as u32);
            }

            gl::BindVertexArray(0);
            gl::BindBuffer(gl::ARRAY_BUFFER, 0);
            gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, 0);
        }

        let count = self.indices.map_or(vertices, |i| i.len());

        Ok(Geometry {
            vao,
            vbo,
            ebo,
            count,
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GBError {
    #[error("Geometry needs at least one vertex attribute")]
    NoAttributes,
    #[error("Invalid data length for given attributes")]
    InvalidDataLength,
    #[error("Index {index} is out of range for {vertices} vertices")]
    IndexOutOfRange { index: u32, vertices: usize },
}

pub enum VertexAttribute {
    Float,
    Vec2,
    Vec3,
}

impl VertexAttribute {
    pub fn size(&self) -> usize {
        match self {
            VertexAttribute::Float => 1,
            VertexAttribute::Vec2 => 2,
            VertexAttribute::Vec3 => 3,
        }
    }
}

pub struct Geometry {
    vao: u32,
    vbo: u32,
    ebo: Option<u32>,
    count: usize,
}

impl Geometry {
    pub fn vao(&self) -> u32 {
        self.vao
    }

    pub fn is_indexed(&self) -> bool {
        self.ebo.is_some()
    }

    /// Number of elements a draw call walks, indices if indexed, vertices otherwise.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Drop for Geometry {
    fn drop(&mut self) {
        unsafe {
            if let Some(ebo) = &self.ebo {
                gl::DeleteBuffers(1, ebo as *const u32);
            }
            gl::DeleteBuffers(1, (&self.vbo) as *const u32);
            gl::DeleteVertexArrays(1, (&self.vao) as *const u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{QUAD, QUAD_INDICES};

    #[test]
    fn quad_layout_is_valid() {
        let builder = GeometryBuilder::new(&QUAD)
            .with_attribute(VertexAttribute::Vec3)
            .with_indices(&QUAD_INDICES);

        assert_eq!(builder.validate(), Ok(4));
    }

    #[test]
    fn rejects_missing_attributes() {
        let builder = GeometryBuilder::new(&QUAD);

        assert_eq!(builder.validate(), Err(GBError::NoAttributes));
    }

    #[test]
    fn rejects_partial_vertex() {
        let builder = GeometryBuilder::new(&QUAD[..10]).with_attribute(VertexAttribute::Vec3);

        assert_eq!(builder.validate(), Err(GBError::InvalidDataLength));
    }

    #[test]
    fn rejects_index_past_last_vertex() {
        let builder = GeometryBuilder::new(&QUAD)
            .with_attribute(VertexAttribute::Vec3)
            .with_indices(&[0, 1, 4]);

        assert_eq!(
            builder.validate(),
            Err(GBError::IndexOutOfRange {
                index: 4,
                vertices: 4
            })
        );
    }

    #[test]
    fn mixed_attributes_share_a_stride() {
        let data = [0.0; 10];
        let builder = GeometryBuilder::new(&data)
            .with_attribute(VertexAttribute::Vec3)
            .with_attribute(VertexAttribute::Vec2);

        assert_eq!(builder.stride(), 5);
        assert_eq!(builder.validate(), Ok(2));
    }
}
