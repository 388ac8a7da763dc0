use neatgym::environment::{Action, Environment, Transition};

use rand::Rng;

use std::convert::Infallible;
use std::f32::consts::PI;

const GRAVITY: f32 = 9.8;
const CART_MASS: f32 = 1.0;
const POLE_MASS: f32 = 0.1;
const POLE_HALF_LENGTH: f32 = 0.5;
const FORCE: f32 = 10.0;
const TIME_STEP: f32 = 0.02;
const ANGLE_LIMIT: f32 = 12.0 * 2.0 * PI / 360.0;
const POSITION_LIMIT: f32 = 2.4;

/// The classic pole balancing task: push a cart left or
/// right to keep the pole hinged on it upright. Every step
/// the pole stays up is worth a reward of 1.
#[derive(Clone, Debug, Default)]
pub struct CartPole {
    position: f32,
    velocity: f32,
    angle: f32,
    angular_velocity: f32,
}

impl CartPole {
    pub fn new() -> CartPole {
        CartPole::default()
    }

    fn observation(&self) -> Vec<f32> {
        vec![self.position, self.velocity, self.angle, self.angular_velocity]
    }

    fn has_fallen(&self) -> bool {
        self.position.abs() > POSITION_LIMIT || self.angle.abs() > ANGLE_LIMIT
    }
}

impl Environment for CartPole {
    type Error = Infallible;

    fn observation_size(&self) -> usize {
        4
    }

    fn action_size(&self) -> usize {
        2
    }

    fn reset(&mut self) -> Result<Vec<f32>, Infallible> {
        let mut rng = rand::thread_rng();
        self.position = rng.gen_range(-0.05..0.05);
        self.velocity = rng.gen_range(-0.05..0.05);
        self.angle = rng.gen_range(-0.05..0.05);
        self.angular_velocity = rng.gen_range(-0.05..0.05);
        Ok(self.observation())
    }

    fn step(&mut self, action: &Action) -> Result<Transition, Infallible> {
        let push_right = match action {
            Action::Discrete(index) => *index == 1,
            Action::Continuous(outputs) => outputs.get(1) > outputs.first(),
        };
        let force = if push_right { FORCE } else { -FORCE };

        // Euler integration of the cart and pole equations of motion.
        let (sin, cos) = self.angle.sin_cos();
        let total_mass = CART_MASS + POLE_MASS;
        let pole_moment = POLE_MASS * POLE_HALF_LENGTH;
        let temp = (force + pole_moment * self.angular_velocity.powi(2) * sin) / total_mass;
        let angular_acceleration = (GRAVITY * sin - cos * temp)
            / (POLE_HALF_LENGTH * (4.0 / 3.0 - POLE_MASS * cos.powi(2) / total_mass));
        let acceleration = temp - pole_moment * angular_acceleration * cos / total_mass;

        self.position += TIME_STEP * self.velocity;
        self.velocity += TIME_STEP * acceleration;
        self.angle += TIME_STEP * self.angular_velocity;
        self.angular_velocity += TIME_STEP * angular_acceleration;

        let done = self.has_fallen();
        Ok(Transition {
            observation: self.observation(),
            reward: if done { 0.0 } else { 1.0 },
            done,
        })
    }
}
