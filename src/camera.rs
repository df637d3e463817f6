use crate::point3d::{Point3D, cross, normalize};
use crate::transform::Mat4;

pub struct Camera {
    pub position: Point3D,
    pub front: Point3D,
    pub right: Point3D,
    pub up: Point3D,
    pub movement_speed: f32,
    world_up: Point3D,
    view: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Point3D::ZERO, Point3D::new(0.0, 0.0, -1.0), 0.01)
    }
}

impl Camera {
    pub fn new(position: Point3D, front: Point3D, movement_speed: f32) -> Self {
        let mut camera = Self {
            position,
            front: normalize(front),
            right: Point3D::new(1.0, 0.0, 0.0),
            up: Point3D::new(0.0, 1.0, 0.0),
            movement_speed,
            world_up: Point3D::new(0.0, 1.0, 0.0),
            view: Mat4::IDENTITY,
        };
        camera.update();
        camera
    }

    /// Rebuilds the right/up basis from `front` and refreshes the view matrix.
    /// Must run after any change to `front` or `position`.
    pub fn update(&mut self) {
        self.right = normalize(cross(self.front, self.world_up));
        self.up = normalize(cross(self.right, self.front));
        self.view = Mat4::look_at(self.position, self.position + self.front, self.up);
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn move_forward(&mut self) {
        self.position += self.front * self.movement_speed;
    }

    pub fn move_back(&mut self) {
        self.position -= self.front * self.movement_speed;
    }

    pub fn move_left(&mut self) {
        self.position -= self.right * self.movement_speed;
    }

    pub fn move_right(&mut self) {
        self.position += self.right * self.movement_speed;
    }

    pub fn rotate_up(&mut self) {
        self.front = normalize(self.front + self.up * self.movement_speed);
    }

    pub fn rotate_down(&mut self) {
        self.front = normalize(self.front - self.up * self.movement_speed);
    }

    pub fn rotate_left(&mut self) {
        self.front = normalize(self.front - self.right * self.movement_speed);
    }

    pub fn rotate_right(&mut self) {
        self.front = normalize(self.front + self.right * self.movement_speed);
    }
}
