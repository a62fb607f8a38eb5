use std::fs::File;
use std::io::{BufRead, BufReader};

use anyhow::{anyhow, bail, Context, Result};

use crate::common::Footprint;

// 4-connected moves, no stay.
const DIRECTIONS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

#[derive(Debug, Clone)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    map_file: String,
    passable: Vec<bool>,
    neighbors: Vec<Vec<usize>>, // per node id, ids of passable 4-neighbors
}

impl Grid {
    pub fn from_file(path: &str) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("map file {path} is not found"))?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let _type = lines
            .next()
            .ok_or_else(|| anyhow!("map file {path} is empty"))??;
        let height = lines
            .next()
            .ok_or_else(|| anyhow!("map file {path} is missing the height line"))??
            .split_whitespace()
            .last()
            .ok_or_else(|| anyhow!("malformed height line in {path}"))?
            .parse::<usize>()?;
        let width = lines
            .next()
            .ok_or_else(|| anyhow!("map file {path} is missing the width line"))??
            .split_whitespace()
            .last()
            .ok_or_else(|| anyhow!("malformed width line in {path}"))?
            .parse::<usize>()?;
        let _map = lines
            .next()
            .ok_or_else(|| anyhow!("map file {path} is missing the map line"))??;

        let mut rows = Vec::with_capacity(height);
        for line in lines.take(height) {
            rows.push(line?);
        }
        Self::build(path.to_string(), width, height, &rows)
    }

    fn build(map_file: String, width: usize, height: usize, rows: &[String]) -> Result<Self> {
        if rows.len() != height {
            bail!(
                "map {} declares height {} but has {} rows",
                map_file,
                height,
                rows.len()
            );
        }

        let mut passable = vec![false; width * height];
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                bail!("map {map_file} declares width {width} but row {y} differs");
            }
            for (x, ch) in row.chars().enumerate() {
                passable[y * width + x] = ch == '.';
            }
        }

        let mut grid = Grid {
            width,
            height,
            map_file,
            passable,
            neighbors: Vec::new(),
        };
        grid.initialize_neighbors();
        Ok(grid)
    }

    fn initialize_neighbors(&mut self) {
        let mut neighbors = vec![Vec::new(); self.width * self.height];
        for (id, adjacent) in neighbors.iter_mut().enumerate() {
            if !self.passable[id] {
                continue;
            }
            let x = (id % self.width) as i32;
            let y = (id / self.width) as i32;
            for &(dx, dy) in &DIRECTIONS {
                let nx = x + dx;
                let ny = y + dy;
                if nx >= 0
                    && ny >= 0
                    && nx < self.width as i32
                    && ny < self.height as i32
                    && self.passable[ny as usize * self.width + nx as usize]
                {
                    adjacent.push(ny as usize * self.width + nx as usize);
                }
            }
        }
        self.neighbors = neighbors;
    }

    pub fn num_nodes(&self) -> usize {
        self.width * self.height
    }

    pub fn map_file(&self) -> &str {
        &self.map_file
    }

    pub fn id(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn pos(&self, id: usize) -> (i32, i32) {
        ((id % self.width) as i32, (id / self.width) as i32)
    }

    pub fn node_at(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let id = y as usize * self.width + x as usize;
        self.passable[id].then_some(id)
    }

    pub fn exists(&self, x: i32, y: i32) -> bool {
        self.node_at(x, y).is_some()
    }

    pub fn neighbors(&self, id: usize) -> &[usize] {
        &self.neighbors[id]
    }

    pub fn euclidean(&self, a: usize, b: usize) -> f32 {
        let (ax, ay) = self.pos(a);
        let (bx, by) = self.pos(b);
        let dx = (ax - bx) as f32;
        let dy = (ay - by) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Whether every cell covered by the footprint anchored at (x, y) is
    /// inside the map and passable.
    pub fn footprint_fits(&self, x: i32, y: i32, footprint: &Footprint) -> bool {
        if !self.exists(x, y) {
            return false;
        }
        match *footprint {
            Footprint::Square { side } => {
                let size = side.floor() as i32;
                if size == 0 {
                    return true;
                }
                for delta in 0..=size {
                    if !self.exists(x + delta, y)
                        || !self.exists(x + delta, y + size)
                        || !self.exists(x, y + delta)
                        || !self.exists(x + size, y + delta)
                    {
                        return false;
                    }
                }
                true
            }
            Footprint::Disk { radius } => {
                // Midpoint-circle walk over the footprint boundary.
                let mut dx = radius as i32;
                let mut dy = 0i32;
                if dx == 0 {
                    return true;
                }
                loop {
                    if !self.exists(x + dx, y + dy)
                        || !self.exists(x - dy, y + dx)
                        || !self.exists(x - dx, y - dy)
                        || !self.exists(x + dy, y - dx)
                    {
                        return false;
                    }
                    if ((dx * dx) as f32) + (((dy + 1) * (dy + 1)) as f32) <= radius * radius {
                        dy += 1;
                    } else {
                        dx -= 1;
                    }
                    if dx == 0 {
                        break;
                    }
                }
                true
            }
        }
    }

    #[cfg(test)]
    pub fn from_ascii(rows: &[&str]) -> Self {
        let owned: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
        Self::build("inline.map".to_string(), rows[0].len(), rows.len(), &owned).unwrap()
    }
}
