use std::fmt;

use serde::{Deserialize, Serialize};

/// 3D asset container formats a reference may point at.
///
/// Parsing the asset is the renderer's job; the format is only a hint passed
/// along with the geometry source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    Glb,
    Gltf,
    Obj,
    Fbx,
}

impl ModelFormat {
    pub const ALL: [ModelFormat; 4] = [Self::Glb, Self::Gltf, Self::Obj, Self::Fbx];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Glb => "glb",
            Self::Gltf => "gltf",
            Self::Obj => "obj",
            Self::Fbx => "fbx",
        }
    }

    /// Detect the format from the trailing extension of a path, ignoring case.
    pub fn from_path(path: &str) -> Option<Self> {
        let (_, ext) = path.rsplit_once('.')?;
        Self::ALL
            .into_iter()
            .find(|f| ext.eq_ignore_ascii_case(f.extension()))
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Glb => "GLB",
            Self::Gltf => "GLTF",
            Self::Obj => "OBJ",
            Self::Fbx => "FBX",
        })
    }
}
