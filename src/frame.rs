// TODO: Align rows to a convenient byte alignment
// TODO: Add padding all around each plane
pub struct Plane {
  pub width: usize,
  pub height: usize,
  pub stride: usize,
  pub data: Box<[u8]>
}

impl Plane {
  pub fn new(width: usize, height: usize) -> Self {
    Self {
      width: width,
      height: height,
      stride: width,
      data: vec![128u8; width*height].into_boxed_slice()
    }
  }

  // Fetch a sample, clamping out-of-bounds coordinates to the plane's edge.
  // This is the border-replication behaviour IPR's edge extrapolation relies
  // on for motion vectors that point outside the picture.
  pub fn get_clamped(&self, x: i32, y: i32) -> u8 {
    let cx = x.clamp(0, self.width as i32 - 1) as usize;
    let cy = y.clamp(0, self.height as i32 - 1) as usize;
    self.data[cy * self.stride + cx]
  }
}

pub struct Frame {
  planes: [Plane; 3]
}

impl Frame {
  pub fn new(y_width: usize, y_height: usize) -> Self {
    let uv_width = (y_width + 1)/2;
    let uv_height = (y_height + 1)/2;

    Self {
      planes: [
        Plane::new(y_width, y_height),
        Plane::new(uv_width, uv_height),
        Plane::new(uv_width, uv_height)
      ]
    }
  }

  pub fn plane(&self, idx: usize) -> &Plane {
    &self.planes[idx]
  }

  pub fn plane_mut(&mut self, idx: usize) -> &mut Plane {
    &mut self.planes[idx]
  }

  pub fn y(&self) -> &Plane {
    &self.planes[0]
  }

  pub fn y_mut(&mut self) -> &mut Plane {
    &mut self.planes[0]
  }

  pub fn u(&self) -> &Plane {
    &self.planes[1]
  }

  pub fn u_mut(&mut self) -> &mut Plane {
    &mut self.planes[1]
  }

  pub fn v(&self) -> &Plane {
    &self.planes[2]
  }

  pub fn v_mut(&mut self) -> &mut Plane {
    &mut self.planes[2]
  }
}

/// A decoded picture kept around as a reference, with the picture-order-count
/// value MVCE's temporal scaling needs and the reconstructed per-SCU CU array
/// MVCE's temporal-candidate lookup reads (§3's "CU Array" data model,
/// retained per reference picture rather than per currently-coded frame).
pub struct Picture {
  pub frame: Frame,
  pub poc: i64,
  pub cu_array: crate::cu::CuArray
}

impl Picture {
  pub fn new(frame: Frame, poc: i64, cu_array: crate::cu::CuArray) -> Self {
    Self { frame, poc, cu_array }
  }
}

/// The two reference picture lists (L0/L1) visible to the CU currently being
/// coded. Index 0 of each list is the picture nearest in coding order, as is
/// conventional; this crate does not build these lists (that is reference
/// picture list construction, external to this subsystem), it only reads
/// them by index.
pub struct RefPicList<'a> {
  pub l0: Vec<&'a Picture>,
  pub l1: Vec<&'a Picture>
}

impl<'a> RefPicList<'a> {
  pub fn get(&self, list: usize, idx: usize) -> &'a Picture {
    match list {
      0 => self.l0[idx],
      1 => self.l1[idx],
      _ => panic!("invalid reference picture list index {}", list)
    }
  }

  pub fn len(&self, list: usize) -> usize {
    match list {
      0 => self.l0.len(),
      1 => self.l1.len(),
      _ => panic!("invalid reference picture list index {}", list)
    }
  }
}
