mod blender_load;

pub use blender_load::BlenderLoad;
