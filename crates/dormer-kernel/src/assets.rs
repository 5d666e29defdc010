//! glTF model loading and the background loader that feeds the scene.
//!
//! Models keep their node hierarchy so animation clips can move individual
//! nodes. Each mesh merges its triangle primitives into one vertex list,
//! coloured by the material's base colour factor.

use bytemuck::{Pod, Zeroable};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use dormer_common::{AssetError, CharacterId};
use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::animation::Property;
use gltf::mesh::util::ReadIndices;
use gltf::mesh::Mode;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::anim::{AnimationClip, TrackQuat, TrackVec3};

/// Vertex layout shared with the scene shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Object-space normal
    pub normal: [f32; 3],
    /// Linear RGBA
    pub color: [f32; 4],
}

/// Triangles of one glTF mesh.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    /// Mesh name, if the file gave one
    pub name: Option<String>,
    /// Vertices of every primitive, concatenated
    pub vertices: Vec<MeshVertex>,
    /// Triangle list indices into `vertices`
    pub indices: Vec<u32>,
}

/// A node of the model hierarchy with its rest transform.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    /// Node name, if the file gave one
    pub name: Option<String>,
    /// Parent node index
    pub parent: Option<usize>,
    /// Mesh drawn at this node
    pub mesh: Option<usize>,
    /// Rest translation
    pub translation: Vec3,
    /// Rest rotation
    pub rotation: Quat,
    /// Rest scale
    pub scale: Vec3,
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            name: None,
            parent: None,
            mesh: None,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// CPU-side model: hierarchy, geometry and clips.
#[derive(Debug, Clone, Default)]
pub struct ModelData {
    /// All nodes, indexed as in the source file
    pub nodes: Vec<NodeData>,
    /// Meshes referenced by nodes
    pub meshes: Vec<MeshData>,
    /// Animation clips by name
    pub clips: HashMap<String, AnimationClip>,
    /// Root nodes of the displayed scene
    pub roots: Vec<usize>,
}

impl ModelData {
    /// Clip names, sorted.
    #[must_use]
    pub fn clip_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clips.keys().cloned().collect();
        names.sort();
        names
    }

    /// Total triangle count over all meshes.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.indices.len() / 3).sum()
    }
}

/// Loads a `.glb` or `.gltf` file.
pub fn load_model(path: &Path) -> Result<ModelData, AssetError> {
    let (doc, buffers, _images) = gltf::import(path).map_err(|e| AssetError::Import {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let buffer_data = |b: gltf::Buffer<'_>| buffers.get(b.index()).map(|d| d.0.as_slice());

    let mut nodes: Vec<NodeData> = doc
        .nodes()
        .map(|n| {
            let (translation, rotation, scale) = decompose_node(&n);
            NodeData {
                name: n.name().map(str::to_string),
                parent: None,
                mesh: n.mesh().map(|m| m.index()),
                translation,
                rotation,
                scale,
            }
        })
        .collect();
    for node in doc.nodes() {
        for child in node.children() {
            if let Some(slot) = nodes.get_mut(child.index()) {
                slot.parent = Some(node.index());
            }
        }
    }

    let mut meshes = Vec::with_capacity(doc.meshes().len());
    for mesh in doc.meshes() {
        let mut data = MeshData {
            name: mesh.name().map(str::to_string),
            ..MeshData::default()
        };
        for prim in mesh.primitives() {
            if prim.mode() != Mode::Triangles {
                warn!(path = %path.display(), mode = ?prim.mode(), "Skipping non-triangle primitive");
                continue;
            }
            let reader = prim.reader(buffer_data);
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let normals: Vec<[f32; 3]> = match reader.read_normals() {
                Some(it) => it.collect(),
                None => vec![[0.0, 1.0, 0.0]; positions.len()],
            };
            let colors: Option<Vec<[f32; 4]>> =
                reader.read_colors(0).map(|c| c.into_rgba_f32().collect());
            let base = prim.material().pbr_metallic_roughness().base_color_factor();

            let start = data.vertices.len() as u32;
            for (i, position) in positions.iter().enumerate() {
                let tint = colors
                    .as_ref()
                    .and_then(|c| c.get(i))
                    .copied()
                    .unwrap_or([1.0; 4]);
                data.vertices.push(MeshVertex {
                    position: *position,
                    normal: normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                    color: [
                        base[0] * tint[0],
                        base[1] * tint[1],
                        base[2] * tint[2],
                        base[3] * tint[3],
                    ],
                });
            }

            let local: Vec<u32> = match reader.read_indices() {
                Some(ReadIndices::U8(it)) => it.map(u32::from).collect(),
                Some(ReadIndices::U16(it)) => it.map(u32::from).collect(),
                Some(ReadIndices::U32(it)) => it.collect(),
                None => (0..positions.len() as u32).collect(),
            };
            data.indices.extend(local.into_iter().map(|i| start + i));
        }
        meshes.push(data);
    }

    if meshes.iter().all(|m| m.indices.is_empty()) {
        return Err(AssetError::NoGeometry(path.to_path_buf()));
    }

    let mut clips = HashMap::new();
    for (index, anim) in doc.animations().enumerate() {
        let name = anim
            .name()
            .map_or_else(|| format!("animation_{index}"), str::to_string);
        let mut clip = AnimationClip {
            name: name.clone(),
            ..AnimationClip::default()
        };
        for channel in anim.channels() {
            let target = channel.target();
            let node = target.node().index();
            let reader = channel.reader(buffer_data);
            let Some(inputs) = reader.read_inputs() else {
                continue;
            };
            let times: Vec<f32> = inputs.collect();
            if let Some(&last) = times.last() {
                clip.duration = clip.duration.max(last);
            }
            let Some(outputs) = reader.read_outputs() else {
                continue;
            };
            match (target.property(), outputs) {
                (Property::Translation, ReadOutputs::Translations(it)) => {
                    let values = it.map(Vec3::from).collect();
                    clip.translations.insert(node, TrackVec3 { times, values });
                }
                (Property::Rotation, ReadOutputs::Rotations(it)) => {
                    let values = it
                        .into_f32()
                        .map(|v| Quat::from_array(v).normalize())
                        .collect();
                    clip.rotations.insert(node, TrackQuat { times, values });
                }
                (Property::Scale, ReadOutputs::Scales(it)) => {
                    let values = it.map(Vec3::from).collect();
                    clip.scales.insert(node, TrackVec3 { times, values });
                }
                (property, _) => {
                    debug!(?property, "Ignoring animation channel");
                }
            }
        }
        clips.insert(name, clip);
    }

    let roots = match doc.default_scene().or_else(|| doc.scenes().next()) {
        Some(scene) => scene.nodes().map(|n| n.index()).collect(),
        None => (0..nodes.len()).filter(|&i| nodes[i].parent.is_none()).collect(),
    };

    Ok(ModelData {
        nodes,
        meshes,
        clips,
        roots,
    })
}

fn decompose_node(node: &gltf::Node<'_>) -> (Vec3, Quat, Vec3) {
    use gltf::scene::Transform;
    match node.transform() {
        Transform::Matrix { matrix } => {
            let (s, r, t) = Mat4::from_cols_array_2d(&matrix).to_scale_rotation_translation();
            (t, r, s)
        }
        Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => (
            Vec3::from(translation),
            Quat::from_array(rotation).normalize(),
            Vec3::from(scale),
        ),
    }
}

/// What to load and what it is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRequest {
    /// The room model
    Room(PathBuf),
    /// A character model
    Character {
        /// Character name
        name: CharacterId,
        /// Model file
        path: PathBuf,
    },
}

impl AssetRequest {
    /// File to load.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Room(path) | Self::Character { path, .. } => path,
        }
    }
}

/// Result of one load request.
#[derive(Debug)]
pub struct LoadedAsset {
    /// The request that produced this result
    pub request: AssetRequest,
    /// Parsed model or the reason it failed
    pub result: Result<Arc<ModelData>, AssetError>,
}

/// Loads models on worker threads and hands results back on a channel.
#[derive(Debug)]
pub struct AssetLoader {
    sender: Sender<LoadedAsset>,
    receiver: Receiver<LoadedAsset>,
    in_flight: usize,
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetLoader {
    /// Creates a loader with nothing in flight.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            in_flight: 0,
        }
    }

    /// Starts loading a model in the background.
    pub fn request(&mut self, request: AssetRequest) {
        debug!(path = %request.path().display(), "Requesting model");
        self.in_flight += 1;

        let sender = self.sender.clone();
        let job = request.clone();
        let spawned = std::thread::Builder::new()
            .name("asset-loader".to_string())
            .spawn(move || {
                let result = load_model(job.path()).map(Arc::new);
                let _ = sender.send(LoadedAsset {
                    request: job,
                    result,
                });
            });

        if let Err(e) = spawned {
            let _ = self.sender.send(LoadedAsset {
                result: Err(AssetError::Import {
                    path: request.path().to_path_buf(),
                    reason: format!("failed to spawn loader thread: {e}"),
                }),
                request,
            });
        }
    }

    /// Returns every result that has arrived since the last poll.
    pub fn poll(&mut self) -> Vec<LoadedAsset> {
        let done: Vec<LoadedAsset> = self.receiver.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(done.len());
        done
    }

    /// Blocks until the next result arrives or the timeout passes.
    pub fn wait_next(&mut self, timeout: Duration) -> Result<LoadedAsset, AssetError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(done) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Ok(done)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                Err(AssetError::Disconnected)
            }
        }
    }

    /// Number of requests without a result yet.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// One red triangle on node 0 with a child node, plus a clip moving node 0
    /// up by 2 over one second.
    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "root", "mesh": 0, "children": [1] },
            { "name": "child", "translation": [1.0, 0.0, 0.0] }
        ],
        "meshes": [{
            "name": "tri",
            "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }]
        }],
        "materials": [{ "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 1.0] } }],
        "animations": [{
            "name": "idle",
            "samplers": [{ "input": 1, "output": 2, "interpolation": "LINEAR" }],
            "channels": [{ "sampler": 0, "target": { "node": 0, "path": "translation" } }]
        }],
        "buffers": [{ "byteLength": 68 }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 8 },
            { "buffer": 0, "byteOffset": 44, "byteLength": 24 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5126, "count": 2, "type": "SCALAR",
              "min": [0.0], "max": [1.0] },
            { "bufferView": 2, "componentType": 5126, "count": 2, "type": "VEC3" }
        ]
    }"#;

    const STATIC_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "nodes": [{ "mesh": 0 }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "buffers": [{ "byteLength": 36 }],
        "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }
        ]
    }"#;

    const EMPTY_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "nodes": [{ "name": "lonely" }]
    }"#;

    fn triangle_bytes() -> Vec<f32> {
        vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
    }

    fn binary_chunk() -> Vec<u8> {
        let mut floats = triangle_bytes();
        floats.extend([0.0, 1.0]);
        floats.extend([0.0, 0.0, 0.0, 0.0, 2.0, 0.0]);
        bytemuck::cast_slice(&floats).to_vec()
    }

    /// Packs JSON and binary data into a GLB container.
    fn build_glb(json: &str, bin: &[u8]) -> Vec<u8> {
        let mut json = json.as_bytes().to_vec();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut bin = bin.to_vec();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }

        let mut total = 12 + 8 + json.len();
        if !bin.is_empty() {
            total += 8 + bin.len();
        }

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(b"JSON");
        out.extend_from_slice(&json);
        if !bin.is_empty() {
            out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
            out.extend_from_slice(b"BIN\0");
            out.extend_from_slice(&bin);
        }
        out
    }

    fn write_glb(dir: &Path, name: &str, json: &str, bin: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).expect("create glb");
        file.write_all(&build_glb(json, bin)).expect("write glb");
        path
    }

    #[test]
    fn test_load_triangle_with_clip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_glb(dir.path(), "character1.glb", TRIANGLE_GLTF, &binary_chunk());

        let model = load_model(&path).expect("load");
        assert_eq!(model.nodes.len(), 2);
        assert_eq!(model.nodes[1].parent, Some(0));
        assert_eq!(model.nodes[1].translation, Vec3::X);
        assert_eq!(model.roots, vec![0]);

        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.triangle_count(), 1);
        assert_eq!(model.meshes[0].indices, vec![0, 1, 2]);
        assert_eq!(model.meshes[0].vertices[0].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(model.meshes[0].vertices[0].normal, [0.0, 1.0, 0.0]);

        assert_eq!(model.clip_names(), vec!["idle".to_string()]);
        let clip = &model.clips["idle"];
        assert_eq!(clip.duration, 1.0);
        assert_eq!(clip.translations[&0].values[1], Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_load_static_model_has_no_clips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bin: Vec<u8> = bytemuck::cast_slice(&triangle_bytes()).to_vec();
        let path = write_glb(dir.path(), "bedroom.glb", STATIC_GLTF, &bin);

        let model = load_model(&path).expect("load");
        assert!(model.clips.is_empty());
        assert_eq!(model.roots, vec![0]);
        assert_eq!(model.meshes[0].vertices[2].color, [1.0; 4]);
    }

    #[test]
    fn test_missing_file_is_import_error() {
        let err = load_model(Path::new("does/not/exist.glb")).expect_err("missing");
        assert!(matches!(err, AssetError::Import { .. }));
    }

    #[test]
    fn test_no_geometry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_glb(dir.path(), "empty.glb", EMPTY_GLTF, &[]);

        let err = load_model(&path).expect_err("empty");
        assert!(matches!(err, AssetError::NoGeometry(_)));
    }

    #[test]
    fn test_loader_delivers_results() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_glb(dir.path(), "character1.glb", TRIANGLE_GLTF, &binary_chunk());

        let mut loader = AssetLoader::new();
        loader.request(AssetRequest::Character {
            name: CharacterId::from("character1"),
            path: path.clone(),
        });
        loader.request(AssetRequest::Room(dir.path().join("missing.glb")));
        assert_eq!(loader.in_flight(), 2);

        let mut results = Vec::new();
        for _ in 0..2 {
            results.push(loader.wait_next(Duration::from_secs(10)).expect("result"));
        }
        assert_eq!(loader.in_flight(), 0);

        let character = results
            .iter()
            .find(|r| matches!(r.request, AssetRequest::Character { .. }))
            .expect("character result");
        assert!(character.result.is_ok());

        let room = results
            .iter()
            .find(|r| matches!(r.request, AssetRequest::Room(_)))
            .expect("room result");
        assert!(room.result.is_err());
    }

    #[test]
    fn test_poll_is_empty_when_idle() {
        let mut loader = AssetLoader::new();
        assert!(loader.poll().is_empty());
        assert_eq!(loader.in_flight(), 0);
    }
}
