/// Identifies an integration point of an element
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IpIndex {
    /// Element (cell) index
    pub element: usize,

    /// Integration point index within the element
    pub ip: usize,
}

impl IpIndex {
    /// Allocates a new instance
    pub fn new(element: usize, ip: usize) -> Self {
        IpIndex { element, ip }
    }
}

/// Holds a per-integration-point array with committed (old) and trial (current) values
///
/// The arrays are allocated once with `n_comp` components for each of the
/// `n_ip × n_element` integration points. The old values only change in
/// [HistoryArray::commit]; the current values are discarded by [HistoryArray::reject].
#[derive(Clone, Debug)]
pub struct HistoryArray {
    n_comp: usize,
    n_ip: usize,
    n_element: usize,
    old: Vec<f64>,
    current: Vec<f64>,
}

impl HistoryArray {
    /// Allocates a new instance with zeroed values
    pub fn new(n_comp: usize, n_ip: usize, n_element: usize) -> Self {
        let len = n_comp * n_ip * n_element;
        HistoryArray {
            n_comp,
            n_ip,
            n_element,
            old: vec![0.0; len],
            current: vec![0.0; len],
        }
    }

    /// Returns the number of components per integration point
    pub fn n_comp(&self) -> usize {
        self.n_comp
    }

    /// Returns the number of integration points per element
    pub fn n_ip(&self) -> usize {
        self.n_ip
    }

    /// Returns the number of elements
    pub fn n_element(&self) -> usize {
        self.n_element
    }

    #[inline]
    fn range(&self, idx: IpIndex) -> std::ops::Range<usize> {
        let start = (idx.element * self.n_ip + idx.ip) * self.n_comp;
        start..(start + self.n_comp)
    }

    /// Returns the committed values
    pub fn old(&self, idx: IpIndex) -> &[f64] {
        &self.old[self.range(idx)]
    }

    /// Returns the trial values
    pub fn current(&self, idx: IpIndex) -> &[f64] {
        &self.current[self.range(idx)]
    }

    /// Returns the trial values for modification
    pub fn current_mut(&mut self, idx: IpIndex) -> &mut [f64] {
        let range = self.range(idx);
        &mut self.current[range]
    }

    /// Sets the trial values
    pub fn set_current(&mut self, idx: IpIndex, values: &[f64]) {
        self.current_mut(idx).copy_from_slice(values);
    }

    /// Copies the trial values onto the committed values
    pub fn commit(&mut self) {
        self.old.copy_from_slice(&self.current);
    }

    /// Restores the trial values from the committed values
    pub fn reject(&mut self) {
        self.current.copy_from_slice(&self.old);
    }
}

/// Holds a scalar value per integration point
#[derive(Clone, Debug)]
pub struct IpScalars {
    n_ip: usize,
    values: Vec<f64>,
}

impl IpScalars {
    /// Allocates a new instance with zeroed values
    pub fn new(n_ip: usize, n_element: usize) -> Self {
        IpScalars {
            n_ip,
            values: vec![0.0; n_ip * n_element],
        }
    }

    /// Returns the value
    pub fn get(&self, idx: IpIndex) -> f64 {
        self.values[idx.element * self.n_ip + idx.ip]
    }

    /// Sets the value
    pub fn set(&mut self, idx: IpIndex, value: f64) {
        self.values[idx.element * self.n_ip + idx.ip] = value;
    }

    /// Adds to the value
    pub fn add(&mut self, idx: IpIndex, value: f64) {
        self.values[idx.element * self.n_ip + idx.ip] += value;
    }

    /// Sets all values to zero
    pub fn reset(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
