//! Headless culling demo
//!
//! Builds a field of spinning cube clusters and drives a fixed number of
//! frames through the scene graph:
//! - frustum-gated single-pass rendering of every node
//! - periodic full-subtree and BVH traversals for statistics
//! - a BVH-accelerated sphere query against one cube
//! - a broad-phase overlap sweep between clusters
//!
//! Usage: `culling_demo [scene.toml | scene.ron]`

use std::sync::Arc;

use collision_scene::config::{Config, ConfigError, SceneConfig};
use collision_scene::foundation::logging;
use collision_scene::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use collision_scene::assets::Model;
use collision_scene::physics::collision::BoundingSphere;
use collision_scene::render::CommandRecorder;
use collision_scene::scene::{Frustum, NodeId, SceneError, SceneGraph, TraversalMode};
use log::{debug, info, warn};
use rand::prelude::*;

// Scene layout
const CLUSTER_COUNT: usize = 12;
const CUBES_PER_CLUSTER: usize = 8;
const FIELD_RADIUS: f32 = 40.0;
const CLUSTER_RADIUS: f32 = 4.0;
const CUBE_HALF_EXTENT: f32 = 0.5;

// Simulation
const FRAME_COUNT: u32 = 240;
const FRAME_TIME: f32 = 1.0 / 60.0;
const STATS_INTERVAL: u32 = 60;
const RNG_SEED: u64 = 0x5eed;

// Camera
const CAMERA_EYE: [f32; 3] = [0.0, 12.0, 60.0];
const FIELD_OF_VIEW_DEG: f32 = 60.0;
const ASPECT_RATIO: f32 = 16.0 / 9.0;
const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 120.0;

/// Demo errors
#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error("Failed to load scene config: {0}")]
    Config(#[from] ConfigError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}

/// A group node spinning its cubes around its own origin
struct Cluster {
    group: NodeId,
    cubes: Vec<NodeId>,
    spin: Vec3,
}

struct CullingDemo {
    scene: SceneGraph,
    clusters: Vec<Cluster>,
    view_projection: Mat4,
    frustum: Frustum,
}

impl CullingDemo {
    fn new(config: &SceneConfig) -> Result<Self, DemoError> {
        let mut rng = StdRng::seed_from_u64(RNG_SEED);
        let mut scene = SceneGraph::with_config(config.culling);
        let cube = Arc::new(Model::cube(CUBE_HALF_EXTENT, &config.bvh));

        info!("Cube model: {}, BVH height {}", cube, cube.bvh_root().height());

        let world_root = scene.create_named_node("world", None);
        let mut clusters = Vec::with_capacity(CLUSTER_COUNT);

        for cluster_index in 0..CLUSTER_COUNT {
            let group = scene.create_named_node(format!("cluster_{}", cluster_index), None);
            scene.add_child(world_root, group)?;
            scene.set_position(group, random_offset(&mut rng, FIELD_RADIUS))?;

            let mut cubes = Vec::with_capacity(CUBES_PER_CLUSTER);
            for cube_index in 0..CUBES_PER_CLUSTER {
                let id = scene.create_named_node(
                    format!("cube_{}_{}", cluster_index, cube_index),
                    Some(Arc::clone(&cube)),
                );
                scene.add_child(group, id)?;
                scene.set_position(id, random_offset(&mut rng, CLUSTER_RADIUS))?;
                scene.set_rotation(id, random_offset(&mut rng, std::f32::consts::PI))?;
                scene.set_scale(id, Vec3::from_element(rng.gen_range(0.5..2.0)))?;
                cubes.push(id);
            }

            let spin = Vec3::new(0.0, rng.gen_range(-1.0..1.0), rng.gen_range(-0.3..0.3));
            clusters.push(Cluster { group, cubes, spin });
        }

        let view = Mat4::look_at(Vec3::from(CAMERA_EYE), Vec3::zeros(), Vec3::y());
        let projection = Mat4::perspective(
            utils::deg_to_rad(FIELD_OF_VIEW_DEG),
            ASPECT_RATIO,
            NEAR_PLANE,
            FAR_PLANE,
        );
        let view_projection = projection * Mat4::clip_axis_flip() * view;
        let frustum = Frustum::from_matrix(&view_projection);

        info!(
            "Built scene: {} nodes in {} clusters, radius estimate {:?}",
            scene.len(),
            clusters.len(),
            config.culling.radius_estimate
        );

        Ok(Self {
            scene,
            clusters,
            view_projection,
            frustum,
        })
    }

    fn run(&mut self) -> Result<(), DemoError> {
        let mut recorder = CommandRecorder::with_base_transform(self.view_projection);

        for frame in 1..=FRAME_COUNT {
            self.update(FRAME_TIME)?;
            recorder.clear();

            let visible = self.cull_and_draw(&mut recorder);
            debug!("Frame {}: {} visible nodes", frame, visible);

            if frame % STATS_INTERVAL == 0 {
                self.report(frame, visible)?;
            }
        }

        if recorder.depth() != 0 {
            warn!("Transform stack left at depth {}", recorder.depth());
        }
        Ok(())
    }

    /// Spin every cluster around its own origin
    fn update(&mut self, delta_time: f32) -> Result<(), DemoError> {
        for cluster in &self.clusters {
            let rotation = self.scene.rotation(cluster.group) + cluster.spin * delta_time;
            self.scene.set_rotation(cluster.group, rotation)?;
        }
        Ok(())
    }

    /// Frustum-gated pass over every node, returning how many were drawn
    fn cull_and_draw(&self, recorder: &mut CommandRecorder) -> usize {
        self.scene.reset_render_flags();

        self.clusters
            .iter()
            .flat_map(|cluster| cluster.cubes.iter())
            .filter(|&&id| self.scene.non_recursive_render(id, &self.frustum, recorder))
            .count()
    }

    fn report(&self, frame: u32, visible: usize) -> Result<(), DemoError> {
        let total = self.clusters.len() * CUBES_PER_CLUSTER;
        info!(
            "Frame {}: {}/{} cubes visible ({:.1}% culled)",
            frame,
            visible,
            total,
            100.0 * (total - visible) as f32 / total as f32
        );

        let mut stats = CommandRecorder::with_base_transform(self.view_projection);
        let drawn = self.scene.render_all(TraversalMode::Normal, &mut stats);
        info!("  Full traversal: {} models, {} triangles", drawn, stats.triangle_total());

        stats.clear();
        self.scene.render_all(TraversalMode::Bvh, &mut stats);
        info!("  BVH traversal: {} boxes", stats.commands().len());

        self.query_first_cube()?;
        self.report_overlaps()?;
        Ok(())
    }

    /// Query the triangles of one cube touched by a sphere around one of its corners
    fn query_first_cube(&self) -> Result<(), DemoError> {
        let Some(&id) = self.clusters.first().and_then(|cluster| cluster.cubes.first()) else {
            return Ok(());
        };

        let world = self.scene.world_transform(id);
        let corner = Vec3::from_element(CUBE_HALF_EXTENT);
        let query_sphere = BoundingSphere::new(utils::transform_point(&world, &corner), CUBE_HALF_EXTENT);

        let hits = self.scene.triangles_in_sphere(id, &query_sphere)?;
        info!(
            "  Query at {:?}: {}/{} triangles",
            query_sphere.center,
            hits.len(),
            self.scene.triangle_count(id)?
        );
        Ok(())
    }

    /// Broad phase between the first cube of every cluster
    fn report_overlaps(&self) -> Result<(), DemoError> {
        let leaders: Vec<NodeId> = self
            .clusters
            .iter()
            .filter_map(|cluster| cluster.cubes.first().copied())
            .collect();

        let mut overlapping = 0;
        for (index, &a) in leaders.iter().enumerate() {
            for &b in &leaders[index + 1..] {
                if self.scene.nodes_overlapping(a, b)? {
                    debug!("Overlap: {} / {}", self.scene[a], self.scene[b]);
                    overlapping += 1;
                }
            }
        }

        info!("  Broad phase: {} overlapping cluster pairs", overlapping);
        Ok(())
    }
}

/// Random vector with each component in `-extent..extent`
fn random_offset(rng: &mut impl Rng, extent: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading scene config from {}", path);
            SceneConfig::load_from_file(&path).map_err(DemoError::from)?
        }
        None => SceneConfig::default(),
    };

    let mut demo = CullingDemo::new(&config)?;
    demo.run()?;

    info!("Done after {} frames", FRAME_COUNT);
    Ok(())
}
